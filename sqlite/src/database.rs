//! [`Database`] and [`Transactional`] over rusqlite.

use std::ops::Deref;
use std::path::Path;

use rowmap_core::Value;
use rowmap_store::{
    Database, ExecResult, Result, Row, Rows, StoreError, TransactionHandle, Transactional,
};
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::convert::{Param, from_sql};

fn query(conn: &Connection, sql: &str, args: &[Value]) -> Result<Rows> {
    let mut stmt = conn.prepare_cached(sql).map_err(StoreError::driver)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut cursor = stmt
        .query(params_from_iter(args.iter().map(Param)))
        .map_err(StoreError::driver)?;

    let mut rows = Vec::new();
    while let Some(row) = cursor.next().map_err(StoreError::driver)? {
        let values = (0..columns.len())
            .map(|i| row.get_ref(i).map(from_sql))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::driver)?;
        rows.push(Row::new(values));
    }
    Ok(Rows::new(columns, rows))
}

fn exec(conn: &Connection, sql: &str, args: &[Value]) -> Result<ExecResult> {
    let mut stmt = conn.prepare_cached(sql).map_err(StoreError::driver)?;
    let changed = stmt
        .execute(params_from_iter(args.iter().map(Param)))
        .map_err(StoreError::driver)?;
    Ok(ExecResult {
        rows_affected: changed as u64,
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}

/// A SQLite connection.
///
/// Dereferences to the underlying [`Connection`] for anything rowmap does
/// not cover, such as creating tables.
///
/// `last_insert_id` is whatever `sqlite3_last_insert_rowid` reports for the
/// connection after the statement ran.
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(StoreError::driver)?;
        debug!(path = %path.display(), "Opened SQLite database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::driver)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl From<Connection> for SqliteDatabase {
    fn from(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Deref for SqliteDatabase {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Database for SqliteDatabase {
    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows> {
        query(&self.conn, sql, args)
    }

    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        exec(&self.conn, sql, args)
    }
}

impl Transactional for SqliteDatabase {
    type Transaction<'t> = SqliteTransaction<'t>;

    fn begin(&mut self) -> Result<SqliteTransaction<'_>> {
        let tx = self.conn.transaction().map_err(StoreError::driver)?;
        debug!("Began SQLite transaction");
        Ok(SqliteTransaction { tx })
    }
}

/// An open SQLite transaction. Dropping it without committing rolls back.
pub struct SqliteTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl Database for SqliteTransaction<'_> {
    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows> {
        query(&self.tx, sql, args)
    }

    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        exec(&self.tx, sql, args)
    }
}

impl TransactionHandle for SqliteTransaction<'_> {
    fn commit(self) -> Result<()> {
        self.tx.commit().map_err(StoreError::driver)
    }

    fn rollback(self) -> Result<()> {
        self.tx.rollback().map_err(StoreError::driver)
    }
}
