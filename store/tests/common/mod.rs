//! An in-memory stand-in for a SQL driver.
//!
//! Records every call, simulates the schema tracking table, and replays
//! scripted result sets for all other queries.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use rowmap_core::Value;
use rowmap_store::{
    Database, ExecResult, Result, Row, Rows, StoreError, TransactionHandle, Transactional,
};

pub const TRACKING: &str = "__kk_go_scheme";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeError(pub String);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fake driver: {}", self.0)
    }
}

impl std::error::Error for FakeError {}

/// One executed or queried statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
pub struct FakeDatabase {
    pub calls: RefCell<Vec<Call>>,
    /// Tracking rows: (id, name, scheme).
    pub snapshots: RefCell<Vec<(i64, String, String)>>,
    pub results: RefCell<VecDeque<Rows>>,
    pub fail_on: RefCell<Option<String>>,
    pub next_id: Cell<i64>,
    pub report_insert_id: Cell<bool>,
    pub committed: Cell<usize>,
    pub rolled_back: Cell<usize>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        let db = Self::default();
        db.next_id.set(1);
        db.report_insert_id.set(true);
        db
    }

    /// Queues the result of the next non-tracking query.
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows.into_iter().map(Row::new).collect();
        self.results.borrow_mut().push_back(Rows::new(columns, rows));
    }

    /// Makes every statement containing `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.borrow_mut() = Some(needle.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_on.borrow_mut() = None;
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.sql.clone()).collect()
    }

    pub fn clear_log(&self) {
        self.calls.borrow_mut().clear();
    }

    /// DDL statements issued against non-tracking tables.
    pub fn ddl(&self) -> Vec<String> {
        self.sql_log()
            .into_iter()
            .filter(|sql| !sql.contains(TRACKING))
            .filter(|sql| sql.starts_with("CREATE") || sql.starts_with("ALTER"))
            .collect()
    }

    pub fn stored_scheme(&self, table: &str) -> Option<String> {
        self.snapshots
            .borrow()
            .iter()
            .find(|(_, name, _)| name == table)
            .map(|(_, _, scheme)| scheme.clone())
    }

    fn record(&self, sql: &str, args: &[Value]) -> Result<()> {
        self.calls.borrow_mut().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        match self.fail_on.borrow().as_deref() {
            Some(needle) if sql.contains(needle) => {
                Err(StoreError::driver(FakeError(format!("rejected: {sql}"))))
            }
            _ => Ok(()),
        }
    }

    fn text(args: &[Value], index: usize) -> String {
        args.get(index)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn tracking_query(&self, sql: &str, args: &[Value]) -> Rows {
        let name = Self::text(args, 0);
        let snapshots = self.snapshots.borrow();
        let found = snapshots.iter().find(|(_, n, _)| *n == name);
        if sql.starts_with("SELECT id, scheme") {
            let rows = found
                .map(|(id, _, scheme)| {
                    vec![Row::new(vec![Value::Integer(*id), Value::from(scheme.as_str())])]
                })
                .unwrap_or_default();
            Rows::new(vec!["id".into(), "scheme".into()], rows)
        } else {
            let rows = found
                .map(|(id, _, _)| vec![Row::new(vec![Value::Integer(*id)])])
                .unwrap_or_default();
            Rows::new(vec!["id".into()], rows)
        }
    }

    fn tracking_exec(&self, sql: &str, args: &[Value]) -> ExecResult {
        let mut snapshots = self.snapshots.borrow_mut();
        if sql.starts_with("INSERT") {
            let id = snapshots.len() as i64 + 1;
            snapshots.push((id, Self::text(args, 0), Self::text(args, 1)));
            ExecResult {
                rows_affected: 1,
                last_insert_id: Some(id),
            }
        } else if sql.starts_with("UPDATE") {
            let id = args.get(1).and_then(Value::as_i64);
            let scheme = Self::text(args, 0);
            let mut affected = 0;
            for row in snapshots.iter_mut().filter(|row| Some(row.0) == id) {
                row.2 = scheme.clone();
                affected += 1;
            }
            ExecResult {
                rows_affected: affected,
                last_insert_id: None,
            }
        } else {
            ExecResult::default()
        }
    }
}

impl Database for FakeDatabase {
    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows> {
        self.record(sql, args)?;
        if sql.contains(&format!("`{TRACKING}`")) {
            return Ok(self.tracking_query(sql, args));
        }
        Ok(self
            .results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Rows::empty(Vec::new())))
    }

    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        self.record(sql, args)?;
        if sql.contains(&format!("`{TRACKING}`")) {
            return Ok(self.tracking_exec(sql, args));
        }
        if sql.starts_with("INSERT") {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            return Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: self.report_insert_id.get().then_some(id),
            });
        }
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }
}

/// Buffers statements until commit.
pub struct FakeTransaction<'a> {
    db: &'a FakeDatabase,
    pending: RefCell<Vec<Call>>,
}

impl Database for FakeTransaction<'_> {
    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows> {
        self.db.query(sql, args)
    }

    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        if let Some(needle) = self.db.fail_on.borrow().as_deref() {
            if sql.contains(needle) {
                return Err(StoreError::driver(FakeError(format!("rejected: {sql}"))));
            }
        }
        self.pending.borrow_mut().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }
}

impl TransactionHandle for FakeTransaction<'_> {
    fn commit(self) -> Result<()> {
        self.db
            .calls
            .borrow_mut()
            .extend(self.pending.into_inner());
        self.db.committed.set(self.db.committed.get() + 1);
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.db.rolled_back.set(self.db.rolled_back.get() + 1);
        Ok(())
    }
}

impl Transactional for FakeDatabase {
    type Transaction<'t> = FakeTransaction<'t>;

    fn begin(&mut self) -> Result<FakeTransaction<'_>> {
        Ok(FakeTransaction {
            db: self,
            pending: RefCell::new(Vec::new()),
        })
    }
}
