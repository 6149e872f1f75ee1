use std::collections::HashMap;

use crate::{error::EvalError, value::Value};

/// Name used to ask a collection scope for its elements.
pub const ELEMENTS: &str = "*";

/// One level of nested data the evaluator reads from.
///
/// `get` resolves a name to a value; a nested scope is returned as a value
/// too (usually a [`Value::Object`]) and becomes the context for the next
/// name on the path. A collection scope answers [`ELEMENTS`] with a
/// [`Value::Array`] of its elements.
///
/// `Ok(None)` means the name does not exist, which the evaluator reports as
/// a missing key. A name that exists but holds nothing should resolve to
/// `Ok(Some(Value::Null))`. A context backed by something that can fail
/// returns the failure, usually as [`EvalError::Lookup`], and evaluation
/// stops with it.
pub trait Context {
    fn get(&self, name: &str) -> Result<Option<Value>, EvalError>;
}

impl Context for Value {
    fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        Ok(match self {
            Value::Object(map) => map.get(name).cloned(),
            Value::Array(_) if name == ELEMENTS => Some(self.clone()),
            _ => None,
        })
    }
}

impl Context for HashMap<String, Value> {
    fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        Ok(HashMap::get(self, name).cloned())
    }
}

impl Context for serde_json::Value {
    fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        Ok(match self {
            serde_json::Value::Object(map) => map.get(name).cloned().map(Value::from),
            serde_json::Value::Array(_) if name == ELEMENTS => Some(Value::from(self.clone())),
            _ => None,
        })
    }
}

impl<T: Context + ?Sized> Context for &T {
    fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        (**self).get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_context_resolves_nested_scopes() {
        let doc = json!({"user": {"age": 30}, "tags": ["a", "b"]});

        let user = Context::get(&doc, "user").unwrap().unwrap();
        assert_eq!(user.get("age"), Ok(Some(Value::Integer(30))));
        assert_eq!(Context::get(&doc, "missing"), Ok(None));

        let tags = Context::get(&doc, "tags").unwrap().unwrap();
        assert_eq!(
            tags.get(ELEMENTS),
            Ok(Some(Value::Array(vec![Value::from("a"), Value::from("b")])))
        );
    }

    #[test]
    fn test_scalar_has_no_names() {
        assert_eq!(Value::Integer(1).get("x"), Ok(None));
        assert_eq!(Value::Null.get(ELEMENTS), Ok(None));
    }
}
