//! Parse-once templates with per-call parameter binding.
//!
//! A [`Specification`] holds the tree of a filter template with its
//! placeholders still in place. Every [`matches`](Specification::matches) or
//! [`compile`](Specification::compile) call binds the caller's parameters into
//! a fresh copy of that tree; the cached tree itself is never modified, so one
//! specification can be shared between threads.
//!
//! ```
//! use predicate_spec::{Params, Specification};
//! use serde_json::json;
//!
//! let spec = Specification::parse("$[?(@.age >= %d)]").unwrap();
//! let doc = json!({"age": 30});
//!
//! assert!(spec.matches(&doc, &Params::new().arg(25)).unwrap());
//! assert!(!spec.matches(&doc, &Params::new().arg(35)).unwrap());
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use parking_lot::RwLock;

use crate::{
    ast::{Node, Operand, Placeholder, PlaceholderKey, PlaceholderKind},
    compiler::{CompiledSql, SqlCompiler},
    context::Context,
    error::{BindError, Error, SyntaxError},
    evaluator::Evaluator,
    parser::Parser,
    value::Value,
};

/// Values for the placeholders of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub positional: Vec<Value>,
    pub named: HashMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the value for the next positional placeholder.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets the value of `%(name)s`.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, placeholder: &Placeholder) -> Result<&Value, BindError> {
        match &placeholder.key {
            PlaceholderKey::Index(index) => self
                .positional
                .get(*index)
                .ok_or(BindError::MissingPositional(*index)),
            PlaceholderKey::Name(name) => self
                .named
                .get(name)
                .ok_or_else(|| BindError::MissingNamed(name.clone())),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Params {
    fn from(values: Vec<T>) -> Self {
        Params {
            positional: values.into_iter().map(Into::into).collect(),
            named: HashMap::new(),
        }
    }
}

/// Applies the conversion a placeholder asks for.
///
/// NULL binds to every kind.
fn convert(placeholder: &Placeholder, value: &Value) -> Result<Value, BindError> {
    let converted = match (placeholder.kind, value) {
        (PlaceholderKind::Any, v) | (_, v @ Value::Null) => Some(v.clone()),
        (PlaceholderKind::Integer, v) => v.as_int().map(Value::Integer),
        (PlaceholderKind::Float, v @ (Value::Integer(_) | Value::Float(_) | Value::Decimal(_))) => {
            v.as_float().map(Value::Float)
        }
        (PlaceholderKind::Float, _) => None,
    };

    converted.ok_or_else(|| BindError::Conversion {
        placeholder: placeholder.to_string(),
        expected: match placeholder.kind {
            PlaceholderKind::Integer => "integer",
            PlaceholderKind::Float => "float",
            PlaceholderKind::Any => "any",
        },
        actual: value.type_name(),
    })
}

/// Returns a copy of `node` with every placeholder replaced by its parameter.
pub fn bind(node: &Node, params: &Params) -> Result<Node, BindError> {
    let boxed = |n: &Node| bind(n, params).map(Box::new);

    Ok(match node {
        Node::Value(Operand::Placeholder(placeholder)) => {
            let value = convert(placeholder, params.lookup(placeholder)?)?;
            Node::Value(Operand::Literal(value))
        }
        Node::Value(Operand::Literal(_)) | Node::GlobalScope | Node::Item => node.clone(),
        Node::Object { parent, name } => Node::Object {
            parent: boxed(parent)?,
            name: name.clone(),
        },
        Node::Field { object, name } => Node::Field {
            object: boxed(object)?,
            name: name.clone(),
        },
        Node::Collection { parent, predicate } => Node::Collection {
            parent: boxed(parent)?,
            predicate: boxed(predicate)?,
        },
        Node::Prefix {
            operator,
            operand,
            associativity,
        } => Node::Prefix {
            operator: *operator,
            operand: boxed(operand)?,
            associativity: *associativity,
        },
        Node::Infix {
            left,
            operator,
            right,
            associativity,
        } => Node::Infix {
            left: boxed(left)?,
            operator: *operator,
            right: boxed(right)?,
            associativity: *associativity,
        },
        Node::Postfix {
            operand,
            operator,
            associativity,
        } => Node::Postfix {
            operand: boxed(operand)?,
            operator: *operator,
            associativity: *associativity,
        },
    })
}

/// A parsed filter template.
#[derive(Debug, Clone)]
pub struct Specification {
    template: String,
    tree: Arc<Node>,
}

impl Specification {
    pub fn parse(template: &str) -> Result<Self, SyntaxError> {
        Ok(Specification {
            template: template.to_string(),
            tree: Arc::new(Parser::parse(template)?),
        })
    }

    /// Wraps a tree built in code.
    pub fn from_tree(tree: Node) -> Self {
        Specification {
            template: format!("$[?({})]", tree),
            tree: Arc::new(tree),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The cached tree, placeholders unbound.
    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn bind(&self, params: &Params) -> Result<Node, BindError> {
        if !self.tree.has_placeholders() {
            return Ok(Node::clone(&self.tree));
        }
        bind(&self.tree, params)
    }

    /// Binds `params` and evaluates the result against `context`.
    pub fn matches(&self, context: &dyn Context, params: &Params) -> Result<bool, Error> {
        let bound = self.bind(params)?;
        Ok(Evaluator::evaluate(&bound, context)?)
    }

    /// Binds `params` and compiles the result with `compiler`.
    pub fn compile(&self, params: &Params, compiler: SqlCompiler<'_>) -> Result<CompiledSql, Error> {
        let bound = self.bind(params)?;
        Ok(compiler.compile(&bound)?)
    }
}

static GLOBAL: LazyLock<Templates> = LazyLock::new(Templates::new);

/// Specifications keyed by template text, parsed on first use.
#[derive(Debug, Default)]
pub struct Templates {
    cache: RwLock<HashMap<String, Arc<Specification>>>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache.
    pub fn global() -> &'static Templates {
        &GLOBAL
    }

    /// Returns the cached specification for `template`, parsing it on a miss.
    ///
    /// Templates that fail to parse are not cached.
    pub fn get_or_parse(&self, template: &str) -> Result<Arc<Specification>, SyntaxError> {
        if let Some(spec) = self.cache.read().get(template) {
            log::trace!("template cache hit: {:?}", template);
            return Ok(Arc::clone(spec));
        }

        log::debug!("template cache miss: {:?}", template);
        let parsed = Arc::new(Specification::parse(template)?);

        // Another caller may have parsed the same template meanwhile
        let mut cache = self.cache.write();
        let spec = cache
            .entry(template.to_string())
            .or_insert_with(|| parsed);
        Ok(Arc::clone(spec))
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}
