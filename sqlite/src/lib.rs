//! SQLite driver for rowmap.
//!
//! Wraps a [`rusqlite::Connection`] as a [`Database`](rowmap_store::Database)
//! so records can be inserted, queried, and scanned through
//! [`RecordQuery`](rowmap_store::RecordQuery), and grouped with
//! [`transaction`](rowmap_store::transaction).
//!
//! SQLite accepts the backtick identifiers and `?` placeholders that
//! statements are rendered with. The installer's DDL targets MySQL
//! (`AUTO_INCREMENT`, inline `INDEX`, `CHANGE`), so SQLite tables are created
//! with native DDL.
//!
//! # Quick start
//!
//! ```no_run
//! use rowmap_core::{Fields, Object, Record, Value};
//! use rowmap_sqlite::SqliteDatabase;
//! use rowmap_store::RecordQuery;
//!
//! #[derive(Debug, Default, Clone, Fields, Record)]
//! struct Task {
//!     #[field(flatten)]
//!     base: Object,
//!     title: String,
//!     done: bool,
//! }
//!
//! let db = SqliteDatabase::open("tasks.db").unwrap();
//! db.execute_batch(
//!     "CREATE TABLE IF NOT EXISTS task (
//!          id INTEGER PRIMARY KEY AUTOINCREMENT,
//!          title TEXT NOT NULL DEFAULT '',
//!          done INTEGER NOT NULL DEFAULT 0
//!      )",
//! )
//! .unwrap();
//!
//! let query = RecordQuery::new(&db, "").unwrap();
//! let mut task = Task { title: "write docs".into(), ..Task::default() };
//! query.insert(&mut task).unwrap();
//!
//! let open: Vec<Task> = query.fetch_all("WHERE done = ?", &[Value::from(false)]).unwrap();
//! println!("{} open tasks", open.len());
//! ```

mod convert;
mod database;

pub use database::{SqliteDatabase, SqliteTransaction};
