//! The stored record of a table's last applied schema.
//!
//! A snapshot is kept as JSON text in the tracking table, one row per
//! physical table:
//!
//! ```json
//! {"age":{"dbindex":"","dbtype":"INT","dbvalue":"DEFAULT 0","name":"age"}}
//! ```
//!
//! `dbvalue` holds the full `DEFAULT ...` clause, or an empty string.

use std::collections::BTreeMap;

use rowmap_core::{FieldDescriptor, FieldSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One column as it was last applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotField {
    pub name: String,
    #[serde(rename = "dbtype")]
    pub db_type: String,
    #[serde(rename = "dbvalue")]
    pub db_value: String,
    #[serde(rename = "dbindex")]
    pub db_index: String,
}

impl SnapshotField {
    pub fn from_descriptor(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name.clone(),
            db_type: field.sql_type(),
            db_value: field.default_clause(),
            db_index: field.index.clone().unwrap_or_default(),
        }
    }
}

/// Field name to applied column, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, SnapshotField>,
}

impl Snapshot {
    /// Captures every ordinary field of `fields`; `id` is never recorded.
    pub fn from_fields(fields: &FieldSet) -> Self {
        let fields = fields
            .ordinary()
            .map(|field| (field.name.clone(), SnapshotField::from_descriptor(field)))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&SnapshotField> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A snapshot row read from the tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    /// Primary key of the tracking row.
    pub id: i64,
    pub table: String,
    pub snapshot: Snapshot,
}
