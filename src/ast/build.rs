//! Constructors for building predicate trees in code.
//!
//! ```
//! use predicate_spec::ast::build::*;
//!
//! // age >= 18 && (country == "NL" || country == "BE")
//! let adult = greater_than_equal(field(global_scope(), "age"), value(18));
//! let benelux = or(
//!     equal(field(global_scope(), "country"), value("NL")),
//!     [equal(field(global_scope(), "country"), value("BE"))],
//! );
//! let predicate = and(adult, [benelux]);
//! ```

use crate::{
    ast::{Associativity, Node, Operand, Operator, Placeholder},
    value::Value,
};

pub fn value(v: impl Into<Value>) -> Node {
    Node::Value(Operand::Literal(v.into()))
}

pub fn placeholder(placeholder: Placeholder) -> Node {
    Node::Value(Operand::Placeholder(placeholder))
}

pub fn global_scope() -> Node {
    Node::GlobalScope
}

pub fn item() -> Node {
    Node::Item
}

pub fn object(parent: Node, name: impl Into<String>) -> Node {
    Node::Object {
        parent: Box::new(parent),
        name: name.into(),
    }
}

pub fn field(object: Node, name: impl Into<String>) -> Node {
    Node::Field {
        object: Box::new(object),
        name: name.into(),
    }
}

/// Some element of `parent` satisfies `predicate`.
pub fn collection(parent: Node, predicate: Node) -> Node {
    Node::Collection {
        parent: Box::new(parent),
        predicate: Box::new(predicate),
    }
}

/// Alias of [`collection`].
pub fn any(parent: Node, predicate: Node) -> Node {
    collection(parent, predicate)
}

/// Every element of `parent` satisfies `predicate`, as `!any(!predicate)`.
///
/// True for an empty collection.
pub fn all(parent: Node, predicate: Node) -> Node {
    not(collection(parent, not(predicate)))
}

pub fn prefix(operator: Operator, operand: Node) -> Node {
    Node::Prefix {
        operator,
        operand: Box::new(operand),
        associativity: operator.associativity(),
    }
}

pub fn infix(left: Node, operator: Operator, right: Node) -> Node {
    Node::Infix {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        associativity: operator.associativity(),
    }
}

pub fn postfix(operand: Node, operator: Operator) -> Node {
    Node::Postfix {
        operand: Box::new(operand),
        operator,
        associativity: Associativity::Left,
    }
}

fn fold(operator: Operator, left: Node, rest: impl IntoIterator<Item = Node>) -> Node {
    rest.into_iter()
        .fold(left, |acc, right| infix(acc, operator, right))
}

/// Left-folds `left` and `rest` with `AND`: `and(a, [b, c])` is `(a AND b) AND c`.
pub fn and(left: Node, rest: impl IntoIterator<Item = Node>) -> Node {
    fold(Operator::And, left, rest)
}

/// Left-folds `left` and `rest` with `OR`.
pub fn or(left: Node, rest: impl IntoIterator<Item = Node>) -> Node {
    fold(Operator::Or, left, rest)
}

pub fn not(operand: Node) -> Node {
    prefix(Operator::Not, operand)
}

pub fn equal(left: Node, right: Node) -> Node {
    infix(left, Operator::Equal, right)
}

pub fn not_equal(left: Node, right: Node) -> Node {
    infix(left, Operator::NotEqual, right)
}

pub fn less_than(left: Node, right: Node) -> Node {
    infix(left, Operator::LessThan, right)
}

pub fn less_than_equal(left: Node, right: Node) -> Node {
    infix(left, Operator::LessThanEqual, right)
}

pub fn greater_than(left: Node, right: Node) -> Node {
    infix(left, Operator::GreaterThan, right)
}

pub fn greater_than_equal(left: Node, right: Node) -> Node {
    infix(left, Operator::GreaterThanEqual, right)
}

pub fn add(left: Node, right: Node) -> Node {
    infix(left, Operator::Add, right)
}

pub fn subtract(left: Node, right: Node) -> Node {
    infix(left, Operator::Subtract, right)
}

pub fn multiply(left: Node, right: Node) -> Node {
    infix(left, Operator::Multiply, right)
}

pub fn divide(left: Node, right: Node) -> Node {
    infix(left, Operator::Divide, right)
}

pub fn modulo(left: Node, right: Node) -> Node {
    infix(left, Operator::Modulo, right)
}

pub fn left_shift(left: Node, right: Node) -> Node {
    infix(left, Operator::LeftShift, right)
}

pub fn right_shift(left: Node, right: Node) -> Node {
    infix(left, Operator::RightShift, right)
}

pub fn negative(operand: Node) -> Node {
    prefix(Operator::Negative, operand)
}

pub fn positive(operand: Node) -> Node {
    prefix(Operator::Positive, operand)
}

pub fn is_null(operand: Node) -> Node {
    postfix(operand, Operator::IsNull)
}

pub fn is_not_null(operand: Node) -> Node {
    postfix(operand, Operator::IsNotNull)
}

#[test]
fn test_and_left_folds() {
    let a = field(global_scope(), "a");
    let b = field(global_scope(), "b");
    let c = field(global_scope(), "c");

    let built = and(a.clone(), [b.clone(), c.clone()]);
    let expected = infix(infix(a, Operator::And, b), Operator::And, c);
    assert_eq!(built, expected);
}

#[test]
fn test_single_operand_is_unchanged() {
    let a = field(global_scope(), "a");
    assert_eq!(or(a.clone(), []), a);
}
