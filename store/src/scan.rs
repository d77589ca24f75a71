//! Decoding result rows into records.
//!
//! A [`Scanner`] belongs to one record and one result set. On the first row
//! it resolves which field each returned column feeds; later rows reuse that
//! mapping. Columns with no matching field are read and discarded.
//!
//! Booleans are stored as `INT(1)`: their columns are read as integers and
//! coerced (`nonzero => true`) once the whole row has been read. JSON-kind
//! columns are decoded leniently: `NULL` or malformed JSON leaves the field
//! at its default value, and malformed input is listed in the
//! [`ScanReport`] instead of failing the scan.

use rowmap_core::{FieldError, Fields, StorageKind, Value, describe};
use tracing::warn;

use crate::db::{Row, Rows};
use crate::error::{Result, StoreError};

/// Where one result column goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Discard,
    Plain(String),
    Bool(String),
    Json(String),
}

/// Per-row outcome of a successful scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// JSON-kind fields reset to their default because the column held
    /// malformed JSON.
    pub degraded: Vec<String>,
}

impl ScanReport {
    /// Returns `true` if every field was decoded as stored.
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// A scan session bound to one record.
pub struct Scanner<'r, R: Fields + 'static> {
    record: &'r mut R,
    slots: Option<Vec<Slot>>,
}

impl<'r, R: Fields + 'static> Scanner<'r, R> {
    pub fn new(record: &'r mut R) -> Self {
        Self {
            record,
            slots: None,
        }
    }

    /// Decodes `row` into the record.
    ///
    /// `columns` must be the column names of the result `row` came from; they
    /// are only consulted on the first call.
    pub fn scan(&mut self, columns: &[String], row: Row) -> Result<ScanReport> {
        let slots = self.slots.get_or_insert_with(|| resolve::<R>(columns));
        let mut report = ScanReport::default();
        let mut flags = Vec::new();

        for (slot, value) in slots.iter().zip(row.into_values()) {
            match slot {
                Slot::Discard => {}
                Slot::Plain(name) => {
                    self.record
                        .set_field(name, value)
                        .map_err(|e| StoreError::field(name, e))?;
                }
                Slot::Bool(name) => {
                    let n = match value {
                        Value::Null => 0,
                        other => other.as_i64().ok_or_else(|| {
                            StoreError::field(
                                name,
                                FieldError::TypeMismatch {
                                    expected: "integer",
                                    found: other.type_name(),
                                },
                            )
                        })?,
                    };
                    flags.push((name, n));
                }
                Slot::Json(name) => match self.record.set_field(name, value) {
                    Ok(_) => {}
                    Err(e) if e.is_decode() => {
                        warn!(field = %name, error = %e, "Malformed JSON column, field reset");
                        report.degraded.push(name.clone());
                    }
                    Err(e) => return Err(StoreError::field(name, e)),
                },
            }
        }

        for (name, n) in flags {
            self.record
                .set_field(name, Value::Integer((n != 0) as i64))
                .map_err(|e| StoreError::field(name, e))?;
        }

        Ok(report)
    }

    /// Scans the next row of `rows`, or returns `None` when the cursor is
    /// exhausted.
    pub fn scan_next(&mut self, rows: &mut Rows) -> Result<Option<ScanReport>> {
        match rows.next() {
            Some(row) => {
                let columns = rows.columns().to_vec();
                self.scan(&columns, row).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn record(&self) -> &R {
        self.record
    }

    pub fn record_mut(&mut self) -> &mut R {
        self.record
    }
}

fn resolve<R: Fields + 'static>(columns: &[String]) -> Vec<Slot> {
    let fields = describe::<R>();
    columns
        .iter()
        .map(|column| match fields.get(column) {
            None => Slot::Discard,
            Some(field) if field.kind == StorageKind::Bool => Slot::Bool(field.name.clone()),
            Some(field) if field.is_json => Slot::Json(field.name.clone()),
            Some(field) => Slot::Plain(field.name.clone()),
        })
        .collect()
}
