//! CLI support for predicate-spec
//!
//! Provides programmatic access to the `pspec` commands for embedding in
//! other tools.

mod check;

pub use check::{CheckOptions, CheckResult, Mode, execute_check, parse_params};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Spec(#[from] crate::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid named parameter '{0}', expected name=value")]
    InvalidNamed(String),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}

impl From<crate::SyntaxError> for CliError {
    fn from(e: crate::SyntaxError) -> Self {
        CliError::Spec(e.into())
    }
}
