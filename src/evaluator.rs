use crate::{
    ast::{Associativity, Node, Operand, Operator, Visitable, Visitor},
    context::{Context, ELEMENTS},
    error::EvalError,
    registry::OperatorRegistry,
    value::Value,
};

/// One entry of the scope stack.
enum Scope<'a> {
    /// The caller's document
    Root(&'a dyn Context),
    /// A scope resolved from a parent, or the current collection element
    Nested(Value),
}

impl Scope<'_> {
    fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        match self {
            Scope::Root(ctx) => ctx.get(name),
            Scope::Nested(value) => value.get(name),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Scope::Nested(Value::Null))
    }
}

/// In-memory evaluation of a bound predicate tree.
///
/// The evaluator walks the tree with a stack of scopes (pushed when a scope
/// node is visited, popped once the name below it has been resolved) and a
/// single register holding the value of the last visited expression.
/// Comparisons and arithmetic go through the [`OperatorRegistry`].
///
/// An evaluator holds per-traversal state: build a fresh one for every
/// evaluation.
///
/// # Examples
///
/// ```
/// use predicate_spec::ast::build::*;
/// use predicate_spec::Evaluator;
/// use serde_json::json;
///
/// let doc = json!({"age": 30});
/// let adult = greater_than_equal(field(global_scope(), "age"), value(18));
///
/// assert!(Evaluator::evaluate(&adult, &doc).unwrap());
/// ```
pub struct Evaluator<'a> {
    registry: &'a OperatorRegistry,
    root: &'a dyn Context,
    scopes: Vec<Scope<'a>>,
    /// Elements under test, innermost collection last
    items: Vec<Value>,
    current: Option<Value>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator over `root` using the global operator registry.
    pub fn new(root: &'a dyn Context) -> Self {
        Self::with_registry(root, OperatorRegistry::global())
    }

    pub fn with_registry(root: &'a dyn Context, registry: &'a OperatorRegistry) -> Self {
        Evaluator {
            registry,
            root,
            scopes: Vec::new(),
            items: Vec::new(),
            current: None,
        }
    }

    /// Evaluates `node` against `root` with a fresh evaluator.
    pub fn evaluate(node: &Node, root: &dyn Context) -> Result<bool, EvalError> {
        let mut evaluator = Evaluator::new(root);
        node.accept(&mut evaluator)?;
        evaluator.result()
    }

    /// Final truth value of the traversal.
    ///
    /// NULL (unknown) counts as not satisfied, as in a SQL `WHERE` clause.
    pub fn result(self) -> Result<bool, EvalError> {
        match self.current {
            Some(Value::Boolean(b)) => Ok(b),
            Some(Value::Null) => Ok(false),
            Some(other) => Err(EvalError::NotBoolean(other.type_name())),
            None => Err(EvalError::NotBoolean("nothing")),
        }
    }

    /// Evaluates a sub-expression to a value.
    pub fn value_of(&mut self, node: &Node) -> Result<Value, EvalError> {
        if node.is_scope() {
            return Err(EvalError::ScopeAsValue(node.to_string()));
        }
        node.accept(self)?;
        self.current
            .take()
            .ok_or_else(|| EvalError::ScopeAsValue(node.to_string()))
    }

    /// Resolves `name` in the scope pushed by visiting `parent`.
    fn resolve(&mut self, parent: &Node, name: &str) -> Result<Option<Value>, EvalError> {
        parent.accept(self)?;
        let scope = self.scopes.pop().ok_or(EvalError::ItemOutsideCollection)?;
        scope.get(name)
    }
}

impl Visitor for Evaluator<'_> {
    type Error = EvalError;

    fn visit_value(&mut self, operand: &Operand) -> Result<(), EvalError> {
        match operand {
            Operand::Literal(value) => {
                self.current = Some(value.clone());
                Ok(())
            }
            Operand::Placeholder(placeholder) => {
                Err(EvalError::UnboundPlaceholder(placeholder.to_string()))
            }
        }
    }

    fn visit_global_scope(&mut self) -> Result<(), EvalError> {
        self.scopes.push(Scope::Root(self.root));
        Ok(())
    }

    fn visit_object(&mut self, parent: &Node, name: &str) -> Result<(), EvalError> {
        match self.resolve(parent, name)? {
            Some(value) => {
                self.scopes.push(Scope::Nested(value));
                Ok(())
            }
            None => Err(EvalError::KeyNotFound(format!("{}.{}", parent, name))),
        }
    }

    fn visit_item(&mut self) -> Result<(), EvalError> {
        let item = self
            .items
            .last()
            .cloned()
            .ok_or(EvalError::ItemOutsideCollection)?;
        self.scopes.push(Scope::Nested(item));
        Ok(())
    }

    fn visit_field(&mut self, object: &Node, name: &str) -> Result<(), EvalError> {
        match self.resolve(object, name)? {
            Some(value) => {
                self.current = Some(value);
                Ok(())
            }
            None => Err(EvalError::KeyNotFound(format!("{}.{}", object, name))),
        }
    }

    fn visit_collection(&mut self, parent: &Node, predicate: &Node) -> Result<(), EvalError> {
        parent.accept(self)?;
        let scope = self.scopes.pop().ok_or(EvalError::ItemOutsideCollection)?;

        let elements = match scope.get(ELEMENTS)? {
            Some(Value::Array(elements)) => elements,
            // A missing collection has no element that could match
            None if scope.is_null() => Vec::new(),
            _ => return Err(EvalError::NotACollection(parent.to_string())),
        };
        log::trace!("testing {} elements of {}", elements.len(), parent);

        let mut outcome = Value::Boolean(false);
        for element in elements {
            self.items.push(element);
            let matched = self.value_of(predicate);
            self.items.pop();

            outcome = self.registry.exec_binary(&outcome, Operator::Or, &matched?)?;
            if outcome == Value::Boolean(true) {
                break;
            }
        }

        self.current = Some(outcome);
        Ok(())
    }

    fn visit_prefix(
        &mut self,
        operator: Operator,
        operand: &Node,
        _associativity: Associativity,
    ) -> Result<(), EvalError> {
        let value = self.value_of(operand)?;
        self.current = Some(self.registry.exec_unary(operator, &value)?);
        Ok(())
    }

    fn visit_infix(
        &mut self,
        left: &Node,
        operator: Operator,
        right: &Node,
        _associativity: Associativity,
    ) -> Result<(), EvalError> {
        let left = self.value_of(left)?;

        // A definite left operand decides AND / OR on its own
        match (operator, &left) {
            (Operator::And, Value::Boolean(false)) | (Operator::Or, Value::Boolean(true)) => {
                self.current = Some(left);
                return Ok(());
            }
            _ => {}
        }

        let right = self.value_of(right)?;
        self.current = Some(self.registry.exec_binary(&left, operator, &right)?);
        Ok(())
    }

    fn visit_postfix(
        &mut self,
        operand: &Node,
        operator: Operator,
        _associativity: Associativity,
    ) -> Result<(), EvalError> {
        let value = self.value_of(operand)?;
        self.current = Some(self.registry.exec_unary(operator, &value)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use serde_json::json;

    #[test]
    fn test_field_lookup() {
        let doc = json!({"user": {"active": true}});
        let node = field(object(global_scope(), "user"), "active");
        assert!(Evaluator::evaluate(&node, &doc).unwrap());
    }

    #[test]
    fn test_missing_key_reports_path() {
        let doc = json!({"user": {}});
        let node = field(object(global_scope(), "user"), "active");
        assert_eq!(
            Evaluator::evaluate(&node, &doc),
            Err(EvalError::KeyNotFound("$.user.active".to_string()))
        );
    }

    #[test]
    fn test_non_boolean_result() {
        let doc = json!({"age": 30});
        let node = field(global_scope(), "age");
        assert_eq!(
            Evaluator::evaluate(&node, &doc),
            Err(EvalError::NotBoolean("integer"))
        );
    }

    #[test]
    fn test_item_outside_collection() {
        let doc = json!({"age": 30});
        let node = greater_than(field(item(), "age"), value(1));
        assert_eq!(
            Evaluator::evaluate(&node, &doc),
            Err(EvalError::ItemOutsideCollection)
        );
    }
}
