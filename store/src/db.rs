//! The database capability consumed by the store.
//!
//! A driver only has to run one parameterized query or statement at a time.
//! Connection pooling, retries, and timeouts stay on the driver's side.

use rowmap_core::Value;

use crate::error::Result;

/// A SQL connection, or a transaction-scoped view of one.
///
/// Both calls bind `args` in order to the `?` placeholders in `sql`.
pub trait Database {
    /// Runs a query and returns every resulting row.
    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows>;

    /// Runs a statement that returns no rows.
    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult>;
}

impl<D: Database + ?Sized> Database for &D {
    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows> {
        (**self).query(sql, args)
    }

    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        (**self).exec(sql, args)
    }
}

/// Outcome of [`Database::exec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Identifier generated by the last insert; `None` when the driver
    /// cannot report one.
    pub last_insert_id: Option<i64>,
}

/// One result row, values in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Cursor over the rows returned by [`Database::query`].
#[derive(Debug)]
pub struct Rows {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }

    /// An empty result with the given columns.
    pub fn empty(columns: Vec<String>) -> Self {
        Self::new(columns, Vec::new())
    }

    /// Column names as reported by the driver.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_cursor() {
        let mut rows = Rows::new(
            vec!["id".into(), "name".into()],
            vec![
                Row::new(vec![Value::Integer(1), Value::from("a")]),
                Row::new(vec![Value::Integer(2), Value::from("b")]),
            ],
        );
        assert_eq!(rows.columns(), ["id", "name"]);
        assert_eq!(rows.remaining(), 2);
        let first = rows.next().unwrap();
        assert_eq!(first.get(1), Some(&Value::from("a")));
        assert_eq!(rows.remaining(), 1);
        assert!(rows.next().is_some());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_empty_rows() {
        let mut rows = Rows::empty(vec!["c".into()]);
        assert_eq!(rows.columns().len(), 1);
        assert!(rows.next().is_none());
    }
}
