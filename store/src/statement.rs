//! SQL statement builders.
//!
//! Each builder renders one statement for a record's table and collects the
//! parameters for its `?` placeholders, position for position. Caller
//! fragments (`WHERE ...`, `ORDER BY ...`) are appended verbatim after a
//! space and their arguments follow the builder's own parameters.
//!
//! Nothing here touches a database; [`RecordQuery`](crate::RecordQuery)
//! executes the result.

use rowmap_core::{FieldDescriptor, ID_FIELD, Record, Value, describe, table_name};

use crate::error::{Result, StoreError};

/// Rendered SQL plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    fn new(sql: String, args: Vec<Value>) -> Self {
        Self { sql, args }
    }
}

fn with_fragment(mut sql: String, fragment: &str) -> String {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sql.push(' ');
        sql.push_str(fragment);
    }
    sql
}

fn selected(keys: Option<&[&str]>, field: &FieldDescriptor) -> bool {
    keys.is_none_or(|keys| keys.contains(&field.name.as_str()))
}

/// Reads the bound form of a field: JSON-kind fields become their text.
fn field_value<R: Record>(record: &R, field: &FieldDescriptor) -> Result<Value> {
    record
        .get_field(&field.name)
        .map(Option::unwrap_or_default)
        .map_err(|e| StoreError::field(&field.name, e))
}

/// `SELECT * FROM table <fragment>`.
pub fn select<R: Record>(record: &R, prefix: &str, fragment: &str, args: &[Value]) -> Statement {
    let sql = format!("SELECT * FROM `{}`", table_name(prefix, record));
    Statement::new(with_fragment(sql, fragment), args.to_vec())
}

/// Selects `id` plus the fields named in `keys`, in declaration order.
///
/// `None` selects every column.
pub fn select_columns<R: Record + 'static>(
    record: &R,
    prefix: &str,
    keys: Option<&[&str]>,
    fragment: &str,
    args: &[Value],
) -> Statement {
    let Some(keys) = keys else {
        return select(record, prefix, fragment, args);
    };

    let mut sql = String::from("SELECT id");
    for field in describe::<R>().ordinary() {
        if keys.contains(&field.name.as_str()) {
            sql.push_str(&format!(",`{}`", field.name));
        }
    }
    sql.push_str(&format!(" FROM `{}`", table_name(prefix, record)));
    Statement::new(with_fragment(sql, fragment), args.to_vec())
}

/// `SELECT COUNT(*) AS c FROM table <fragment>`.
pub fn count<R: Record>(record: &R, prefix: &str, fragment: &str, args: &[Value]) -> Statement {
    let sql = format!("SELECT COUNT(*) AS c FROM `{}`", table_name(prefix, record));
    Statement::new(with_fragment(sql, fragment), args.to_vec())
}

/// `INSERT INTO table(cols) VALUES (?,...)`.
///
/// `id` is left to the database when the record's identifier is zero and
/// written explicitly otherwise.
pub fn insert<R: Record + 'static>(record: &R, prefix: &str) -> Result<Statement> {
    let id = record.id();
    let mut columns = Vec::new();
    let mut args = Vec::new();

    for field in describe::<R>().iter() {
        if field.name == ID_FIELD {
            if id == 0 {
                continue;
            }
            columns.push(format!("`{ID_FIELD}`"));
            args.push(Value::Integer(id));
            continue;
        }
        columns.push(format!("`{}`", field.name));
        args.push(field_value(record, field)?);
    }

    let placeholders = vec!["?"; columns.len()].join(",");
    let sql = format!(
        "INSERT INTO `{}`({}) VALUES ({placeholders})",
        table_name(prefix, record),
        columns.join(","),
    );
    Ok(Statement::new(sql, args))
}

/// `UPDATE table SET col=?,... WHERE id=?` over every field except `id`,
/// restricted to `keys` when given.
///
/// Returns `None` when no column is selected.
pub fn update<R: Record + 'static>(
    record: &R,
    prefix: &str,
    keys: Option<&[&str]>,
) -> Result<Option<Statement>> {
    let mut assignments = Vec::new();
    let mut args = Vec::new();

    for field in describe::<R>().ordinary() {
        if !selected(keys, field) {
            continue;
        }
        assignments.push(format!("`{}`=?", field.name));
        args.push(field_value(record, field)?);
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    args.push(Value::Integer(record.id()));
    let sql = format!(
        "UPDATE `{}` SET {} WHERE id=?",
        table_name(prefix, record),
        assignments.join(","),
    );
    Ok(Some(Statement::new(sql, args)))
}

/// `DELETE FROM table WHERE id=?` for the record's current identifier.
pub fn delete<R: Record>(record: &R, prefix: &str) -> Statement {
    let sql = format!("DELETE FROM `{}` WHERE id=?", table_name(prefix, record));
    Statement::new(sql, vec![Value::Integer(record.id())])
}

/// `DELETE FROM table <fragment>`. The fragment is not inspected.
pub fn delete_where<R: Record>(
    record: &R,
    prefix: &str,
    fragment: &str,
    args: &[Value],
) -> Statement {
    let sql = format!("DELETE FROM `{}`", table_name(prefix, record));
    Statement::new(with_fragment(sql, fragment), args.to_vec())
}
