//! Filter expressions over nested data.
//!
//! A predicate is a tree of [`Node`]s, either parsed from a template such as
//! `$.Items[*][?(@.Price > %d)]` or built in code with [`ast::build`]. The
//! same bound tree can be evaluated in memory with the [`Evaluator`] or
//! compiled to parameterized SQL with the [`SqlCompiler`].
//!
//! ```
//! use predicate_spec::{Params, SchemaRegistry, SqlCompiler, Specification};
//! use predicate_spec::schema::{Relation, TableSchema};
//! use serde_json::json;
//!
//! let spec = Specification::parse("$.Items[*][?(@.Price > %d)]").unwrap();
//! let params = Params::new().arg(1000);
//!
//! let store = json!({"Items": [{"Price": 500}, {"Price": 1500}]});
//! assert!(spec.matches(&store, &params).unwrap());
//!
//! let schema = SchemaRegistry::new().with(
//!     TableSchema::new("stores")
//!         .alias("s")
//!         .relational("Items", Relation::new("items").join("store_id", "id")),
//! );
//! let sql = spec
//!     .compile(&params, SqlCompiler::with_schema(&schema, "stores"))
//!     .unwrap();
//! assert_eq!(
//!     sql.sql,
//!     "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id AND item_1.Price > $1)"
//! );
//! ```

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod context;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod specification;
pub mod value;

pub use ast::{Node, Operator, Token};
pub use compiler::{CompiledSql, SqlCompiler, compile_to_sql};
pub use context::Context;
pub use convert::{json_to_value, value_to_json};
pub use error::{BindError, CompileError, Error, EvalError, OperatorError, SyntaxError};
pub use evaluator::Evaluator;
pub use lexer::Lexer;
pub use parser::Parser;
pub use registry::OperatorRegistry;
pub use schema::SchemaRegistry;
pub use specification::{Params, Specification, Templates};
pub use value::{Value, ValueObject, ValueType};
