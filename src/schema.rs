//! Storage layout of collections, consumed by the SQL compiler.
//!
//! A collection field is either stored inline on its parent row (an array or
//! JSON column, queried with `unnest()`) or in a child table joined back to
//! the parent through one or more key column pairs.
//!
//! Schemas are registered once at startup and only read while compiling.
//! They can be built in code or loaded from JSON:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "table": "stores",
//!       "alias": "s",
//!       "collections": {
//!         "Tags": { "kind": "embedded" },
//!         "Items": {
//!           "kind": "relational",
//!           "table": "items",
//!           "keys": [{ "child": "store_id", "parent": "id" }]
//!         }
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How one collection field is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionMapping {
    /// Array/JSON column on the parent row
    Embedded,
    /// Rows of a child table
    Relational(Relation),
}

/// Child table of a relational collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub table: String,
    /// Join columns; more than one for composite keys
    #[serde(default)]
    pub keys: Vec<JoinKey>,
    /// Alias stem used instead of the singularized field name
    #[serde(default)]
    pub alias: Option<String>,
}

/// `child.<child> = parent.<parent>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKey {
    pub child: String,
    pub parent: String,
}

impl Relation {
    pub fn new(table: impl Into<String>) -> Self {
        Relation {
            table: table.into(),
            keys: Vec::new(),
            alias: None,
        }
    }

    pub fn join(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.keys.push(JoinKey {
            child: child.into(),
            parent: parent.into(),
        });
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Collection mappings of one parent table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub collections: HashMap<String, CollectionMapping>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>) -> Self {
        TableSchema {
            table: table.into(),
            alias: None,
            collections: HashMap::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn embedded(mut self, field: impl Into<String>) -> Self {
        self.collections.insert(field.into(), CollectionMapping::Embedded);
        self
    }

    pub fn relational(mut self, field: impl Into<String>, relation: Relation) -> Self {
        self.collections
            .insert(field.into(), CollectionMapping::Relational(relation));
        self
    }

    pub fn mapping(&self, field: &str) -> Option<&CollectionMapping> {
        self.collections.get(field)
    }

    /// How child tables refer to this table: its alias, else its name.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
}

#[derive(Deserialize)]
struct SchemaFile {
    tables: Vec<TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](SchemaRegistry::register).
    pub fn with(mut self, schema: TableSchema) -> Self {
        self.register(schema);
        self
    }

    /// Adds or replaces the schema of `schema.table`.
    pub fn register(&mut self, schema: TableSchema) {
        self.tables.insert(schema.table.clone(), schema);
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Ok(file
            .tables
            .into_iter()
            .fold(SchemaRegistry::new(), SchemaRegistry::with))
    }
}
