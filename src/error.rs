//! Error taxonomy for parsing, binding, evaluation and SQL compilation.
//!
//! Every failure is a value returned to the caller; nothing inside the crate
//! retries or recovers.

use thiserror::Error;

use crate::ast::Operator;

/// Lexer or parser failure. Parsing stops at the first error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Syntax error at position {position}: {message} (near '{context}')")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the template
    pub position: usize,
    /// The remainder of the input at `position`, truncated
    pub context: String,
}

impl SyntaxError {
    const CONTEXT_LEN: usize = 20;

    pub fn new(message: impl Into<String>, input: &str, position: usize) -> Self {
        let context = input
            .get(position..)
            .unwrap_or_default()
            .chars()
            .take(Self::CONTEXT_LEN)
            .collect();
        SyntaxError {
            message: message.into(),
            position,
            context,
        }
    }
}

/// No registry entry and no capability fallback, or an arithmetic fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    #[error("Operator {operator} not supported for operand types {left} and {right}")]
    Unsupported {
        operator: Operator,
        left: &'static str,
        right: &'static str,
    },

    #[error("Operator {operator} not supported for operand type {operand}")]
    UnsupportedUnary {
        operator: Operator,
        operand: &'static str,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow in {0}")]
    Overflow(Operator),

    #[error("Shift amount {0} out of range")]
    ShiftOutOfRange(i64),
}

/// Failure while evaluating a bound tree against a context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Expected boolean result, got {0}")]
    NotBoolean(&'static str),

    #[error("Not a collection: {0}")]
    NotACollection(String),

    #[error("Item scope referenced outside of a collection predicate")]
    ItemOutsideCollection,

    #[error("Scope {0} used where a value is expected")]
    ScopeAsValue(String),

    #[error("Placeholder {0} is not bound")]
    UnboundPlaceholder(String),

    /// Raised by a [`Context`](crate::Context) that could not answer.
    #[error("Lookup of '{name}' failed: {message}")]
    Lookup { name: String, message: String },

    #[error(transparent)]
    Operator(#[from] OperatorError),
}

/// Failure while substituting parameters into a cached tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("Missing positional parameter {0}")]
    MissingPositional(usize),

    #[error("Missing named parameter '{0}'")]
    MissingNamed(String),

    #[error("Cannot bind {actual} to placeholder {placeholder}: expected {expected}")]
    Conversion {
        placeholder: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Failure while compiling a bound tree to SQL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Placeholder {0} is not bound")]
    UnboundPlaceholder(String),

    #[error("Item scope referenced outside of a wildcard")]
    ItemOutsideWildcard,

    #[error("Collection parent must be a named scope")]
    InvalidCollection,

    #[error("Scope {0} used where a value is expected")]
    ScopeAsValue(String),

    #[error("Invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Crate-level error returned by the one-call entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new("Unexpected character '#'", "$[?(@.a # 1)]", 8);
        assert_eq!(err.context, "# 1)]");
        assert_eq!(
            err.to_string(),
            "Syntax error at position 8: Unexpected character '#' (near '# 1)]')"
        );
    }

    #[test]
    fn test_operator_error_display() {
        let err = OperatorError::Unsupported {
            operator: Operator::GreaterThan,
            left: "string",
            right: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Operator > not supported for operand types string and integer"
        );
        assert_eq!(
            EvalError::from(OperatorError::DivisionByZero).to_string(),
            "Division by zero"
        );
    }
}
