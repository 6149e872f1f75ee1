use crate::ast::{Associativity, Node, Operand, Operator};

/// One callback per node variant.
///
/// Traversal order is up to the visitor: a callback receives the child nodes
/// and decides when (and whether) to call [`Visitable::accept`] on them.
/// Visitors carry per-traversal state and are built fresh for every
/// traversal.
pub trait Visitor {
    type Error;

    fn visit_value(&mut self, operand: &Operand) -> Result<(), Self::Error>;

    fn visit_global_scope(&mut self) -> Result<(), Self::Error>;

    fn visit_object(&mut self, parent: &Node, name: &str) -> Result<(), Self::Error>;

    fn visit_item(&mut self) -> Result<(), Self::Error>;

    fn visit_field(&mut self, object: &Node, name: &str) -> Result<(), Self::Error>;

    fn visit_collection(&mut self, parent: &Node, predicate: &Node) -> Result<(), Self::Error>;

    fn visit_prefix(
        &mut self,
        operator: Operator,
        operand: &Node,
        associativity: Associativity,
    ) -> Result<(), Self::Error>;

    fn visit_infix(
        &mut self,
        left: &Node,
        operator: Operator,
        right: &Node,
        associativity: Associativity,
    ) -> Result<(), Self::Error>;

    fn visit_postfix(
        &mut self,
        operand: &Node,
        operator: Operator,
        associativity: Associativity,
    ) -> Result<(), Self::Error>;
}

pub trait Visitable {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error>;
}

impl Visitable for Node {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Node::Value(operand) => visitor.visit_value(operand),
            Node::GlobalScope => visitor.visit_global_scope(),
            Node::Object { parent, name } => visitor.visit_object(parent, name),
            Node::Item => visitor.visit_item(),
            Node::Field { object, name } => visitor.visit_field(object, name),
            Node::Collection { parent, predicate } => visitor.visit_collection(parent, predicate),
            Node::Prefix {
                operator,
                operand,
                associativity,
            } => visitor.visit_prefix(*operator, operand, *associativity),
            Node::Infix {
                left,
                operator,
                right,
                associativity,
            } => visitor.visit_infix(left, *operator, right, *associativity),
            Node::Postfix {
                operand,
                operator,
                associativity,
            } => visitor.visit_postfix(operand, *operator, *associativity),
        }
    }
}
