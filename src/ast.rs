//! # Predicate Trees
//!
//! This module defines the tree every other component works on: the parser
//! produces it, callers may build it directly with [`build`], the
//! [`Evaluator`](crate::evaluator::Evaluator) runs it against in-memory data
//! and the [`SqlCompiler`](crate::compiler::SqlCompiler) turns it into
//! parameterized SQL.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[nodes]** - The closed set of node variants, values and placeholders
//! - **[operators]** - Prefix, infix and postfix operators
//! - **[visitor]** - Double-dispatch protocol (`Visitable::accept` / `Visitor`)
//! - **[build]** - Constructors for programmatic trees
//!
//! ## Scopes
//!
//! Fields never float free: each hangs off a chain of scope nodes ending at a
//! root. `$.user.age` is
//!
//! ```text
//! Field { object: Object { parent: GlobalScope, name: "user" }, name: "age" }
//! ```
//!
//! Inside the predicate of a wildcard the chain ends at `Item` instead, the
//! element currently being tested:
//!
//! ```text
//! $.Items[*][?(@.Price > 1000)]
//!
//! Collection {
//!     parent: Object { parent: GlobalScope, name: "Items" },
//!     predicate: Infix { Field { Item, "Price" } > Value(1000) },
//! }
//! ```
//!
//! ## Associativity
//!
//! `AND` and `OR` chains always fold to the left: `a && b && c` is
//! `(a && b) && c`, whether parsed or built with [`build::and`].
pub mod build;
pub mod nodes;
pub mod operators;
pub mod tokens;
pub mod visitor;

pub use nodes::{Node, Operand, Placeholder, PlaceholderKey, PlaceholderKind};
pub use operators::{Associativity, Operator};
pub use tokens::{Lexeme, Token};
pub use visitor::{Visitable, Visitor};
