//! DDL generation for record tables and the tracking table.
//!
//! Everything here is pure: statements are rendered from field metadata and
//! stored snapshots, never executed. [`Installer`](crate::Installer) decides
//! which of them to run.
//!
//! Migrations are additive. A field that disappears from a record is left
//! in the live table; only `ADD COLUMN`, `CHANGE` and `CREATE INDEX` are
//! ever emitted.

use rowmap_core::{FieldDescriptor, FieldSet};

use crate::error::{Result, StoreError};
use crate::snapshot::Snapshot;

/// Validates that a table prefix contains only ASCII alphanumeric characters
/// and underscores. The empty prefix is allowed.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Validates a tracking table name: non-empty, same character set as a
/// prefix.
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// `CREATE TABLE` for the snapshot tracking table.
pub fn tracking_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\
         id BIGINT NOT NULL AUTO_INCREMENT, \
         name VARCHAR(64) NULL, \
         scheme TEXT NULL, \
         PRIMARY KEY (id), \
         INDEX name (name ASC)\
         ) AUTO_INCREMENT=1"
    )
}

fn index_clause(field: &FieldDescriptor, spec: &str) -> String {
    format!("INDEX `{0}` (`{0}` {spec})", field.name)
}

/// `CREATE TABLE IF NOT EXISTS` covering every ordinary field, a primary key
/// on `id`, and one `INDEX` per field with an index specification.
///
/// `auto_increment` seeds the identifier sequence when given.
pub fn create_table_sql(table: &str, fields: &FieldSet, auto_increment: Option<i64>) -> String {
    let mut clauses = vec!["id BIGINT NOT NULL AUTO_INCREMENT".to_string()];
    clauses.extend(fields.ordinary().map(FieldDescriptor::column_clause));
    clauses.push("PRIMARY KEY (id)".to_string());
    clauses.extend(
        fields
            .ordinary()
            .filter_map(|field| field.index.as_deref().map(|spec| index_clause(field, spec))),
    );

    let mut sql = format!("CREATE TABLE IF NOT EXISTS `{table}` ({})", clauses.join(", "));
    if let Some(seed) = auto_increment {
        sql.push_str(&format!(" AUTO_INCREMENT = {seed}"));
    }
    sql
}

/// Statements that bring a table described by `previous` up to `fields`,
/// in field order.
pub fn migration_sql(table: &str, fields: &FieldSet, previous: &Snapshot) -> Vec<String> {
    let mut statements = Vec::new();

    for field in fields.ordinary() {
        let stored = previous.get(&field.name);
        match stored {
            None => statements.push(format!(
                "ALTER TABLE `{table}` ADD COLUMN {}",
                field.column_clause()
            )),
            Some(stored)
                if stored.db_type != field.sql_type()
                    || stored.db_value != field.default_clause() =>
            {
                statements.push(format!(
                    "ALTER TABLE `{table}` CHANGE `{}` {}",
                    field.name,
                    field.column_clause()
                ));
            }
            Some(_) => {}
        }

        if let Some(spec) = &field.index {
            if stored.is_none_or(|stored| stored.db_index.is_empty()) {
                statements.push(format!(
                    "CREATE INDEX `{0}` ON `{table}` (`{0}` {spec})",
                    field.name
                ));
            }
        }
    }

    statements
}
