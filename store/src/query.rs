//! Executing record statements against a [`Database`].

use rowmap_core::{Column, Record, Value};
use tracing::{debug, warn};

use crate::db::{Database, ExecResult, Rows};
use crate::error::{Result, StoreError};
use crate::scan::Scanner;
use crate::schema::validate_prefix;
use crate::statement::{self, Statement};

/// Result of [`RecordQuery::insert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub result: ExecResult,
    /// Identifier written back to the record, if the database generated one.
    ///
    /// `None` for explicit-identifier inserts and for drivers that could not
    /// report the generated value; the insert itself succeeded either way.
    pub assigned_id: Option<i64>,
}

/// Statement execution for the tables under one prefix.
///
/// # Examples
///
/// ```no_run
/// # fn demo(db: &impl rowmap_store::Database) -> rowmap_store::Result<()> {
/// # use rowmap_core::{Fields, Object, Record};
/// # #[derive(Default, Clone, Fields, Record)]
/// # struct Tag { #[field(flatten)] base: Object, label: String }
/// use rowmap_store::RecordQuery;
///
/// let query = RecordQuery::new(db, "blog_")?;
/// let mut tag = Tag { label: "rust".into(), ..Tag::default() };
/// let outcome = query.insert(&mut tag)?;
/// assert_eq!(outcome.assigned_id, Some(tag.id()));
///
/// tag.label = "rustlang".into();
/// query.update_columns(&tag, &["label"])?;
/// # Ok(())
/// # }
/// ```
pub struct RecordQuery<'a, D: Database + ?Sized> {
    db: &'a D,
    prefix: String,
}

impl<'a, D: Database + ?Sized> RecordQuery<'a, D> {
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`](crate::StoreError::InvalidPrefix)
    /// if the prefix contains anything but ASCII alphanumerics and `_`.
    pub fn new(db: &'a D, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { db, prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical table name of `record` under this prefix.
    pub fn table_name<R: Record>(&self, record: &R) -> String {
        rowmap_core::table_name(&self.prefix, record)
    }

    pub fn connection(&self) -> &'a D {
        self.db
    }

    fn query(&self, statement: Statement) -> Result<Rows> {
        debug!(sql = %statement.sql, args = statement.args.len(), "Running query");
        self.db.query(&statement.sql, &statement.args)
    }

    fn exec(&self, statement: Statement) -> Result<ExecResult> {
        debug!(sql = %statement.sql, args = statement.args.len(), "Executing statement");
        self.db.exec(&statement.sql, &statement.args)
    }

    /// `SELECT *` from the record's table, filtered by `fragment`.
    pub fn select<R: Record>(&self, record: &R, fragment: &str, args: &[Value]) -> Result<Rows> {
        self.query(statement::select(record, &self.prefix, fragment, args))
    }

    /// Selects `id` plus the fields in `keys`; every column when `keys` is
    /// `None`.
    pub fn select_columns<R: Record + 'static>(
        &self,
        record: &R,
        keys: Option<&[&str]>,
        fragment: &str,
        args: &[Value],
    ) -> Result<Rows> {
        self.query(statement::select_columns(
            record,
            &self.prefix,
            keys,
            fragment,
            args,
        ))
    }

    /// Counts matching rows. A result with no row counts as zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldError`] if the returned cell is not an
    /// integer.
    pub fn count<R: Record>(&self, record: &R, fragment: &str, args: &[Value]) -> Result<i64> {
        let mut rows = self.query(statement::count(record, &self.prefix, fragment, args))?;
        let Some(row) = rows.next() else {
            return Ok(0);
        };
        let column = rows.columns().first().map_or("c", String::as_str);
        let cell = row.get(0).cloned().unwrap_or_default();
        i64::from_value(cell).map_err(|e| StoreError::field(column, e))
    }

    /// Inserts `record`, writing the generated identifier back when its id
    /// was zero.
    ///
    /// A generated identifier the record cannot hold (no `id` field, or one
    /// too narrow) is logged and reported as `assigned_id: None`.
    pub fn insert<R: Record + 'static>(&self, record: &mut R) -> Result<InsertOutcome> {
        let generated = record.id() == 0;
        let result = self.exec(statement::insert(&*record, &self.prefix)?)?;

        let assigned_id = match result.last_insert_id {
            Some(id) if generated => {
                if record.set_id(id) {
                    Some(id)
                } else {
                    let table = self.table_name(&*record);
                    warn!(table = %table, id, "Record cannot hold insert id");
                    None
                }
            }
            None if generated => {
                debug!(table = %self.table_name(&*record), "Driver reported no insert id");
                None
            }
            _ => None,
        };

        Ok(InsertOutcome {
            result,
            assigned_id,
        })
    }

    /// Updates every field except `id`.
    pub fn update<R: Record + 'static>(&self, record: &R) -> Result<ExecResult> {
        self.update_keys(record, None)
    }

    /// Updates only the fields named in `keys`. Nothing is executed when no
    /// key names a field.
    pub fn update_columns<R: Record + 'static>(
        &self,
        record: &R,
        keys: &[&str],
    ) -> Result<ExecResult> {
        self.update_keys(record, Some(keys))
    }

    fn update_keys<R: Record + 'static>(
        &self,
        record: &R,
        keys: Option<&[&str]>,
    ) -> Result<ExecResult> {
        match statement::update(record, &self.prefix, keys)? {
            Some(statement) => self.exec(statement),
            None => {
                debug!(table = %self.table_name(record), "Update selects no columns, skipped");
                Ok(ExecResult::default())
            }
        }
    }

    /// Deletes the row with the record's identifier.
    pub fn delete<R: Record>(&self, record: &R) -> Result<ExecResult> {
        self.exec(statement::delete(record, &self.prefix))
    }

    /// Deletes every row matching `fragment`. The fragment is passed through
    /// unchecked; an empty one deletes the whole table.
    pub fn delete_where<R: Record>(
        &self,
        record: &R,
        fragment: &str,
        args: &[Value],
    ) -> Result<ExecResult> {
        self.exec(statement::delete_where(record, &self.prefix, fragment, args))
    }

    /// Selects and scans every matching row into a fresh record.
    pub fn fetch_all<R>(&self, fragment: &str, args: &[Value]) -> Result<Vec<R>>
    where
        R: Record + Default + Clone + 'static,
    {
        let mut record = R::default();
        let mut rows = self.select(&record, fragment, args)?;
        let columns = rows.columns().to_vec();

        let mut records = Vec::with_capacity(rows.remaining());
        let mut scanner = Scanner::new(&mut record);
        for row in &mut rows {
            *scanner.record_mut() = R::default();
            scanner.scan(&columns, row)?;
            records.push(scanner.record().clone());
        }
        Ok(records)
    }

    /// Scans the first matching row, if any.
    pub fn fetch_one<R>(&self, fragment: &str, args: &[Value]) -> Result<Option<R>>
    where
        R: Record + Default + 'static,
    {
        let mut record = R::default();
        let mut rows = self.select(&record, fragment, args)?;
        let found = Scanner::new(&mut record).scan_next(&mut rows)?.is_some();
        Ok(found.then_some(record))
    }
}
