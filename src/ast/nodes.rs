use std::fmt;

use crate::{
    ast::{Associativity, Operator},
    value::Value,
};

/// Conversion requested by a placeholder: `%s`, `%d` or `%f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// `%s` - any value, bound as given
    Any,
    /// `%d` - integer
    Integer,
    /// `%f` - float
    Float,
}

impl PlaceholderKind {
    pub fn from_conversion(c: char) -> Option<Self> {
        match c {
            's' => Some(PlaceholderKind::Any),
            'd' => Some(PlaceholderKind::Integer),
            'f' => Some(PlaceholderKind::Float),
            _ => None,
        }
    }

    pub fn conversion(self) -> char {
        match self {
            PlaceholderKind::Any => 's',
            PlaceholderKind::Integer => 'd',
            PlaceholderKind::Float => 'f',
        }
    }
}

/// Which parameter a placeholder is bound from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceholderKey {
    /// Zero-based position among the positional placeholders of a template
    Index(usize),
    /// `%(name)s`
    Name(String),
}

/// A parsed-but-unbound value slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub key: PlaceholderKey,
    pub kind: PlaceholderKind,
}

impl Placeholder {
    pub fn positional(index: usize, kind: PlaceholderKind) -> Self {
        Placeholder {
            key: PlaceholderKey::Index(index),
            kind,
        }
    }

    pub fn named(name: impl Into<String>, kind: PlaceholderKind) -> Self {
        Placeholder {
            key: PlaceholderKey::Name(name.into()),
            kind,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            PlaceholderKey::Index(_) => write!(f, "%{}", self.kind.conversion()),
            PlaceholderKey::Name(name) => write!(f, "%({}){}", name, self.kind.conversion()),
        }
    }
}

/// Payload of a `Value` node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Placeholder(Placeholder),
}

/// A node of a predicate tree.
///
/// Trees are immutable values with no back-references. Scope nodes
/// (`GlobalScope`, `Item`, `Object`) form parent chains that always end at
/// exactly one root; `Field` and `Collection` hang off such a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal or deferred placeholder
    Value(Operand),

    /// The document root (`$`)
    GlobalScope,

    /// Named nested scope
    Object { parent: Box<Node>, name: String },

    /// The current element inside a collection predicate (`@` within `[?...]`)
    Item,

    /// Attribute read from a scope
    Field { object: Box<Node>, name: String },

    /// "Some element of `parent` satisfies `predicate`"
    ///
    /// Fields of the predicate are rooted at [`Node::Item`].
    Collection {
        parent: Box<Node>,
        predicate: Box<Node>,
    },

    /// Unary operator in front of its operand (`NOT`, sign)
    Prefix {
        operator: Operator,
        operand: Box<Node>,
        associativity: Associativity,
    },

    /// Binary operator
    Infix {
        left: Box<Node>,
        operator: Operator,
        right: Box<Node>,
        associativity: Associativity,
    },

    /// Unary operator after its operand (`IS NULL`, `IS NOT NULL`)
    Postfix {
        operand: Box<Node>,
        operator: Operator,
        associativity: Associativity,
    },
}

impl Node {
    /// True for the nodes a scope chain terminates at.
    pub fn is_root(&self) -> bool {
        matches!(self, Node::GlobalScope | Node::Item)
    }

    pub fn is_scope(&self) -> bool {
        matches!(self, Node::GlobalScope | Node::Item | Node::Object { .. })
    }

    /// The root this node's scope chain terminates at, if it has one.
    pub fn root(&self) -> Option<&Node> {
        let mut current = self;
        loop {
            match current {
                Node::GlobalScope | Node::Item => return Some(current),
                Node::Object { parent, .. } | Node::Collection { parent, .. } => current = parent,
                Node::Field { object, .. } => current = object,
                _ => return None,
            }
        }
    }

    /// Names along the scope chain, ordered from the root to this node.
    ///
    /// For a `Field` the field name is the last element; a `Collection`
    /// yields the path of its parent scope. Roots contribute nothing.
    pub fn path(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self;
        loop {
            match current {
                Node::Object { parent, name } => {
                    names.push(name.as_str());
                    current = parent;
                }
                Node::Field { object, name } => {
                    names.push(name.as_str());
                    current = object;
                }
                Node::Collection { parent, .. } => current = parent,
                _ => break,
            }
        }
        names.reverse();
        names
    }

    /// Dotted rendering of [`path`](Node::path).
    pub fn dotted_path(&self) -> String {
        self.path().join(".")
    }

    /// Last name on the chain: the field or scope this node names.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Object { name, .. } | Node::Field { name, .. } => Some(name),
            Node::Collection { parent, .. } => parent.name(),
            _ => None,
        }
    }

    /// True if any `Value` node still holds a placeholder.
    pub fn has_placeholders(&self) -> bool {
        match self {
            Node::Value(Operand::Placeholder(_)) => true,
            Node::Value(Operand::Literal(_)) | Node::GlobalScope | Node::Item => false,
            Node::Object { parent, .. } => parent.has_placeholders(),
            Node::Field { object, .. } => object.has_placeholders(),
            Node::Collection { parent, predicate } => {
                parent.has_placeholders() || predicate.has_placeholders()
            }
            Node::Prefix { operand, .. } | Node::Postfix { operand, .. } => {
                operand.has_placeholders()
            }
            Node::Infix { left, right, .. } => left.has_placeholders() || right.has_placeholders(),
        }
    }

    fn fmt_operand(node: &Node, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match node {
            Node::Infix { .. } | Node::Postfix { .. } => write!(f, "({})", node),
            _ => write!(f, "{}", node),
        }
    }
}

/// Renders the tree in filter syntax (without the `$[?...]` wrapper).
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Value(Operand::Literal(value)) => fmt_literal(value, f),
            Node::Value(Operand::Placeholder(placeholder)) => write!(f, "{}", placeholder),
            Node::GlobalScope => f.write_str("$"),
            Node::Item => f.write_str("@"),
            Node::Object { parent, name } => write!(f, "{}.{}", parent, name),
            Node::Field { object, name } => write!(f, "{}.{}", object, name),
            Node::Collection { parent, predicate } => {
                write!(f, "{}[*][?({})]", parent, predicate)
            }
            Node::Prefix {
                operator, operand, ..
            } => {
                f.write_str(operator.symbol())?;
                Self::fmt_operand(operand, f)
            }
            Node::Infix {
                left,
                operator,
                right,
                ..
            } => {
                Self::fmt_operand(left, f)?;
                write!(f, " {} ", operator.symbol())?;
                Self::fmt_operand(right, f)
            }
            Node::Postfix {
                operand, operator, ..
            } => {
                Self::fmt_operand(operand, f)?;
                match operator {
                    Operator::IsNull => f.write_str(" == null"),
                    Operator::IsNotNull => f.write_str(" != null"),
                    other => write!(f, " {}", other.symbol()),
                }
            }
        }
    }
}

/// Writes a literal so that the lexer reads it back as the same value.
///
/// Only numbers, strings, booleans and null exist in filter syntax. Instants
/// are written as their RFC 3339 string; other values use their `Display`.
fn fmt_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        // `Display` never uses exponents; whole floats keep a fraction
        Value::Float(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{}.0", n),
        Value::String(s) => fmt_string(s, f),
        Value::Instant(t) => fmt_string(&t.to_rfc3339(), f),
        other => write!(f, "{}", other),
    }
}

fn fmt_string(s: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}
