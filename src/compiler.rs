//! Compiles a bound predicate tree to a parameterized SQL condition.
//!
//! Values are never inlined: each one becomes a `$N` placeholder and is
//! appended to [`CompiledSql::params`] in placeholder order.
//!
//! Wildcards become `EXISTS` subqueries. Where the collection lives is read
//! from the [`SchemaRegistry`]:
//!
//! ```text
//! embedded    EXISTS (SELECT 1 FROM unnest(Items) AS item_1 WHERE item_1.Price > $1)
//! relational  EXISTS (SELECT 1 FROM items AS item_1
//!                     WHERE item_1.store_id = s.id AND item_1.Price > $1)
//! ```
//!
//! Collections without a mapping are treated as embedded.

use std::{fmt::Write, mem};

use crate::{
    ast::{Associativity, Node, Operand, Operator, Visitable, Visitor},
    error::CompileError,
    schema::{CollectionMapping, SchemaRegistry, TableSchema},
    value::Value,
};

/// SQL text plus the values for its `$1, $2, ...` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSql {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Binding strength of an operator in SQL, higher binds tighter.
pub fn precedence(operator: Operator) -> u8 {
    match operator {
        Operator::Or => 1,
        Operator::And => 2,
        Operator::Not => 3,
        Operator::IsNull | Operator::IsNotNull => 4,
        Operator::Equal
        | Operator::NotEqual
        | Operator::LessThan
        | Operator::LessThanEqual
        | Operator::GreaterThan
        | Operator::GreaterThanEqual => 5,
        Operator::LeftShift | Operator::RightShift => 6,
        Operator::Add | Operator::Subtract => 7,
        Operator::Multiply | Operator::Divide | Operator::Modulo => 8,
        Operator::Positive | Operator::Negative => 9,
    }
}

/// The wildcard whose element scope is currently open.
#[derive(Debug, Clone)]
struct Wildcard<'a> {
    alias: String,
    /// Schema of the child table for relational collections
    table: Option<&'a TableSchema>,
}

/// Position of the node being compiled relative to its parent operator.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    precedence: u8,
    /// Parenthesize children of equal precedence too
    wrap_equal: bool,
}

impl Cursor {
    const TOP: Cursor = Cursor {
        precedence: 0,
        wrap_equal: false,
    };

    fn needs_parens(self, own: u8) -> bool {
        own < self.precedence || (own == self.precedence && self.wrap_equal)
    }
}

pub struct SqlCompiler<'a> {
    schema: Option<&'a SchemaRegistry>,
    table: Option<&'a TableSchema>,
    sql: String,
    params: Vec<Value>,
    cursor: Cursor,
    wildcard: Option<Wildcard<'a>>,
    /// Shared by every wildcard of the traversal, so aliases never repeat
    aliases: usize,
}

impl Default for SqlCompiler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SqlCompiler<'a> {
    /// A compiler without schema information: every collection is embedded.
    pub fn new() -> Self {
        SqlCompiler {
            schema: None,
            table: None,
            sql: String::new(),
            params: Vec::new(),
            cursor: Cursor::TOP,
            wildcard: None,
            aliases: 0,
        }
    }

    /// A compiler for conditions on `table`, resolving collections through
    /// `schema`.
    pub fn with_schema(schema: &'a SchemaRegistry, table: &str) -> Self {
        SqlCompiler {
            schema: Some(schema),
            table: schema.table(table),
            ..Self::new()
        }
    }

    pub fn compile(mut self, node: &Node) -> Result<CompiledSql, CompileError> {
        node.accept(&mut self)?;
        Ok(CompiledSql {
            sql: self.sql,
            params: self.params,
        })
    }

    /// Compiles `child` in the operand position described by `cursor`.
    fn operand(&mut self, child: &Node, cursor: Cursor) -> Result<(), CompileError> {
        let saved = mem::replace(&mut self.cursor, cursor);
        let result = child.accept(self);
        self.cursor = saved;
        result
    }

    fn open(&mut self, own: u8) -> bool {
        let wrap = self.cursor.needs_parens(own);
        if wrap {
            self.sql.push('(');
        }
        wrap
    }

    fn close(&mut self, wrapped: bool) {
        if wrapped {
            self.sql.push(')');
        }
    }

    /// Column reference for a scope chain plus an optional trailing name.
    fn reference(&self, scope: &Node, name: Option<&str>) -> Result<String, CompileError> {
        let mut parts: Vec<&str> = Vec::new();
        match scope.root() {
            Some(Node::Item) => {
                let wildcard = self
                    .wildcard
                    .as_ref()
                    .ok_or(CompileError::ItemOutsideWildcard)?;
                parts.push(&wildcard.alias);
            }
            Some(Node::GlobalScope) => {}
            _ => return Err(CompileError::ScopeAsValue(scope.to_string())),
        }

        let path = scope.path();
        for part in path.iter().copied().chain(name) {
            check_identifier(part)?;
            parts.push(part);
        }
        Ok(parts.join("."))
    }

    fn next_alias(&mut self, stem: &str) -> String {
        self.aliases += 1;
        format!("{}_{}", stem, self.aliases)
    }
}

impl Visitor for SqlCompiler<'_> {
    type Error = CompileError;

    fn visit_value(&mut self, operand: &Operand) -> Result<(), CompileError> {
        match operand {
            Operand::Literal(value) => {
                self.params.push(value.clone());
                // Infallible for String
                let _ = write!(self.sql, "${}", self.params.len());
                Ok(())
            }
            Operand::Placeholder(placeholder) => {
                Err(CompileError::UnboundPlaceholder(placeholder.to_string()))
            }
        }
    }

    fn visit_global_scope(&mut self) -> Result<(), CompileError> {
        Err(CompileError::ScopeAsValue("$".to_string()))
    }

    fn visit_object(&mut self, parent: &Node, name: &str) -> Result<(), CompileError> {
        Err(CompileError::ScopeAsValue(format!("{}.{}", parent, name)))
    }

    fn visit_item(&mut self) -> Result<(), CompileError> {
        Err(CompileError::ScopeAsValue("@".to_string()))
    }

    fn visit_field(&mut self, object: &Node, name: &str) -> Result<(), CompileError> {
        let column = self.reference(object, Some(name))?;
        self.sql.push_str(&column);
        Ok(())
    }

    fn visit_collection(&mut self, parent: &Node, predicate: &Node) -> Result<(), CompileError> {
        let name = match parent {
            Node::Object { name, .. } => name.as_str(),
            _ => return Err(CompileError::InvalidCollection),
        };

        // Captured before the new scope opens so joins point outward. A
        // `$`-rooted collection ranges over the root row even inside a wildcard.
        let (owner, parent_ref) = match (parent.root(), &self.wildcard) {
            (Some(Node::Item), Some(outer)) => (outer.table, Some(outer.alias.clone())),
            (Some(Node::Item), None) => return Err(CompileError::ItemOutsideWildcard),
            _ => (self.table, self.table.map(|t| t.reference().to_string())),
        };
        let mapping = owner.and_then(|t| t.mapping(name)).cloned();

        let (wildcard, predicate_cursor) = match mapping {
            Some(CollectionMapping::Relational(relation)) => {
                check_identifier(&relation.table)?;
                let stem = relation
                    .alias
                    .clone()
                    .unwrap_or_else(|| singularize(name));
                check_identifier(&stem)?;
                let alias = self.next_alias(&stem);
                log::debug!(
                    "collection {} -> table {} as {}",
                    name,
                    relation.table,
                    alias
                );

                let _ = write!(
                    self.sql,
                    "EXISTS (SELECT 1 FROM {} AS {} WHERE ",
                    relation.table, alias
                );
                if !relation.keys.is_empty() {
                    let parent_ref = parent_ref.unwrap_or_else(|| name.to_string());
                    check_identifier(&parent_ref)?;
                    for key in &relation.keys {
                        check_identifier(&key.child)?;
                        check_identifier(&key.parent)?;
                        let _ = write!(
                            self.sql,
                            "{}.{} = {}.{} AND ",
                            alias, key.child, parent_ref, key.parent
                        );
                    }
                }

                let table = self.schema.and_then(|s| s.table(&relation.table));
                let cursor = Cursor {
                    precedence: precedence(Operator::And),
                    wrap_equal: false,
                };
                (Wildcard { alias, table }, cursor)
            }
            Some(CollectionMapping::Embedded) | None => {
                if mapping.is_none() {
                    log::debug!("collection {} has no mapping, treating as embedded", name);
                }
                let source = self.reference(parent, None)?;
                let alias = self.next_alias(&singularize(name));
                log::debug!("collection {} -> unnest({}) as {}", name, source, alias);

                let _ = write!(
                    self.sql,
                    "EXISTS (SELECT 1 FROM unnest({}) AS {} WHERE ",
                    source, alias
                );
                (Wildcard { alias, table: None }, Cursor::TOP)
            }
        };

        let outer = self.wildcard.replace(wildcard);
        let result = self.operand(predicate, predicate_cursor);
        self.wildcard = outer;
        result?;

        self.sql.push(')');
        Ok(())
    }

    fn visit_prefix(
        &mut self,
        operator: Operator,
        operand: &Node,
        associativity: Associativity,
    ) -> Result<(), CompileError> {
        let own = precedence(operator);
        let wrapped = self.open(own);

        // `- -x` would open a SQL comment, so nested signs are parenthesized
        let wrap_equal = match operator {
            Operator::Not => associativity != Associativity::Right,
            _ => true,
        };
        match operator {
            Operator::Not => self.sql.push_str("NOT "),
            other => self.sql.push_str(other.sql()),
        }
        self.operand(
            operand,
            Cursor {
                precedence: own,
                wrap_equal,
            },
        )?;

        self.close(wrapped);
        Ok(())
    }

    fn visit_infix(
        &mut self,
        left: &Node,
        operator: Operator,
        right: &Node,
        associativity: Associativity,
    ) -> Result<(), CompileError> {
        let own = precedence(operator);
        let wrapped = self.open(own);

        self.operand(
            left,
            Cursor {
                precedence: own,
                wrap_equal: associativity != Associativity::Left,
            },
        )?;
        let _ = write!(self.sql, " {} ", operator.sql());
        self.operand(
            right,
            Cursor {
                precedence: own,
                wrap_equal: associativity != Associativity::Right,
            },
        )?;

        self.close(wrapped);
        Ok(())
    }

    fn visit_postfix(
        &mut self,
        operand: &Node,
        operator: Operator,
        associativity: Associativity,
    ) -> Result<(), CompileError> {
        let own = precedence(operator);
        let wrapped = self.open(own);

        self.operand(
            operand,
            Cursor {
                precedence: own,
                wrap_equal: associativity != Associativity::Left,
            },
        )?;
        let _ = write!(self.sql, " {}", operator.sql());

        self.close(wrapped);
        Ok(())
    }
}

/// Compiles `node` without schema information.
pub fn compile_to_sql(node: &Node) -> Result<CompiledSql, CompileError> {
    SqlCompiler::new().compile(node)
}

fn check_identifier(name: &str) -> Result<(), CompileError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier(name.to_string()))
    }
}

/// Alias stem for a collection name: lowercased and singular.
fn singularize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();

    if let Some(stem) = lower.strip_suffix("ies")
        && !stem.is_empty()
    {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes", "uses"] {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    if lower.len() > 1 && lower.ends_with('s') && !lower.ends_with("ss") {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

#[test]
fn test_singularize() {
    assert_eq!(singularize("Items"), "item");
    assert_eq!(singularize("categories"), "category");
    assert_eq!(singularize("Addresses"), "address");
    assert_eq!(singularize("boxes"), "box");
    assert_eq!(singularize("statuses"), "status");
    assert_eq!(singularize("class"), "class");
    assert_eq!(singularize("data"), "data");
}

#[test]
fn test_identifier_check() {
    assert!(check_identifier("store_id").is_ok());
    assert!(check_identifier("1abc").is_err());
    assert!(check_identifier("a; DROP TABLE x").is_err());
}
