//! Statement execution, row scanning, and schema installation for rowmap
//! records.
//!
//! This crate works against any SQL driver that implements [`Database`]:
//! two calls, `query` and `exec`, with `?` positional parameters. Generated
//! SQL uses backtick-quoted identifiers (MySQL family).
//!
//! # Architecture
//!
//! - **`db`**: the [`Database`] capability, [`Rows`] cursor, and [`ExecResult`]
//! - **`statement`**: pure SQL builders for select/insert/update/delete/count
//! - **`query`**: [`RecordQuery`], executing statements for one table prefix
//! - **`scan`**: [`Scanner`], decoding rows back into a record
//! - **`schema`**: DDL generation: create table, additive migrations
//! - **`snapshot`**: the stored record of a table's last applied schema
//! - **`migration`**: [`Installer`], diffing records against snapshots
//! - **`transaction`**: commit-or-rollback helper over [`Transactional`]
//! - **`config`**: YAML-backed [`StoreConfig`]
//!
//! # Quick start: install
//!
//! ```no_run
//! # fn demo(db: &impl rowmap_store::Database) -> rowmap_store::Result<()> {
//! use rowmap_core::{Fields, Object, Record};
//! use rowmap_store::{Installer, StoreConfig};
//!
//! #[derive(Default, Fields, Record)]
//! struct Note {
//!     #[field(flatten)]
//!     base: Object,
//!     #[field(length = 120)]
//!     title: String,
//! }
//!
//! let config = StoreConfig::default();
//! let installer = Installer::from_config(db, &config)?;
//! installer.open()?;
//! let report = installer.install(&Note::default())?;
//! println!("{} statements applied", report.statements_applied);
//! # Ok(())
//! # }
//! ```
//!
//! # Quick start: queries
//!
//! ```no_run
//! # fn demo(db: &impl rowmap_store::Database) -> rowmap_store::Result<()> {
//! # use rowmap_core::{Fields, Object, Record};
//! # #[derive(Default, Clone, Fields, Record)]
//! # struct Note {
//! #     #[field(flatten)]
//! #     base: Object,
//! #     title: String,
//! # }
//! use rowmap_core::Value;
//! use rowmap_store::RecordQuery;
//!
//! let query = RecordQuery::new(db, "app_")?;
//! let mut note = Note { title: "hello".into(), ..Note::default() };
//! query.insert(&mut note)?;
//!
//! let notes: Vec<Note> = query.fetch_all("WHERE title = ?", &[Value::from("hello")])?;
//! let total = query.count(&note, "WHERE title = ?", &[Value::from("hello")])?;
//! assert_eq!(notes.len(), total as usize);
//! # Ok(())
//! # }
//! ```

mod config;
mod db;
mod error;
mod migration;
mod query;
mod scan;
pub mod schema;
mod snapshot;
pub mod statement;
mod transaction;

pub use config::{DEFAULT_TRACKING_TABLE, SchemaConfig, StoreConfig};
pub use db::{Database, ExecResult, Row, Rows};
pub use error::{Result, StoreError};
pub use migration::{InstallPlan, InstallReport, Installer, TableState};
pub use query::{InsertOutcome, RecordQuery};
pub use scan::{ScanReport, Scanner};
pub use snapshot::{Snapshot, SnapshotField, StoredSnapshot};
pub use statement::Statement;
pub use transaction::{TransactionHandle, Transactional, transaction};
