//! Run filter templates against JSON input or compile them to SQL

use super::CliError;
use crate::{
    CompiledSql, Params, SchemaRegistry, Specification, SqlCompiler, Value, json_to_value,
};

/// What to do with the template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Only validate syntax
    #[default]
    Syntax,
    /// Evaluate against the JSON input
    Match,
    /// Compile to SQL
    Sql,
}

/// Options for a check operation
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The filter template
    pub template: String,
    pub mode: Mode,
    /// JSON document to match against
    pub input: Option<String>,
    /// Positional parameters, JSON encoded
    pub params: Vec<String>,
    /// Named parameters as `name=JSON`
    pub named: Vec<String>,
    /// Schema file contents
    pub schema: Option<String>,
    /// Table the SQL condition applies to
    pub table: Option<String>,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax is valid; carries the parsed tree in filter syntax
    SyntaxValid(String),
    Matched(bool),
    Sql(CompiledSql),
}

impl CheckResult {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CheckResult::SyntaxValid(tree) => serde_json::json!({ "valid": true, "tree": tree }),
            CheckResult::Matched(matched) => serde_json::json!({ "matched": matched }),
            CheckResult::Sql(compiled) => serde_json::json!({
                "sql": compiled.sql,
                "params": compiled
                    .params
                    .iter()
                    .cloned()
                    .map(serde_json::Value::from)
                    .collect::<Vec<_>>(),
            }),
        }
    }
}

/// Parameter text is read as JSON; anything that is not JSON is a string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .map(json_to_value)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Builds [`Params`] from `--param` and `--named` arguments.
pub fn parse_params(params: &[String], named: &[String]) -> Result<Params, CliError> {
    let mut result = Params::new();
    for param in params {
        result = result.arg(parse_value(param));
    }
    for entry in named {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| CliError::InvalidNamed(entry.clone()))?;
        result = result.named(name.trim(), parse_value(value));
    }
    Ok(result)
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let spec = Specification::parse(&options.template)?;
    let params = parse_params(&options.params, &options.named)?;

    match options.mode {
        Mode::Syntax => Ok(CheckResult::SyntaxValid(spec.tree().to_string())),
        Mode::Match => {
            let input = options.input.as_ref().ok_or(CliError::NoInput)?;
            let document: serde_json::Value = serde_json::from_str(input)?;
            let matched = spec.matches(&document, &params)?;
            Ok(CheckResult::Matched(matched))
        }
        Mode::Sql => {
            let schema = match &options.schema {
                Some(json) => SchemaRegistry::from_json(json)?,
                None => SchemaRegistry::new(),
            };
            let compiler = match &options.table {
                Some(table) => SqlCompiler::with_schema(&schema, table),
                None => SqlCompiler::new(),
            };
            let compiled = spec.compile(&params, compiler)?;
            Ok(CheckResult::Sql(compiled))
        }
    }
}
