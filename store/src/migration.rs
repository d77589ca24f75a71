//! Snapshot-driven table installation.
//!
//! Each physical table is in one of two states:
//!
//! - **Unregistered**: the tracking table has no row for it. Installing
//!   emits one `CREATE TABLE IF NOT EXISTS` and inserts a snapshot row.
//! - **Registered**: a snapshot row exists. Installing diffs the record
//!   against the snapshot, applies the additive migration, and overwrites
//!   the row in place.
//!
//! The read/diff/write sequence is not atomic: two processes installing the
//! same table at once may both insert a snapshot row.

use rowmap_core::{Record, Value, describe};
use tracing::{debug, info, warn};

use crate::config::{SchemaConfig, StoreConfig};
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::schema::{
    create_table_sql, migration_sql, tracking_table_sql, validate_prefix, validate_table_name,
};
use crate::snapshot::{Snapshot, StoredSnapshot};

/// Whether a table has a snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Unregistered,
    Registered { snapshot_id: i64 },
}

/// What [`Installer::install`] would do for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub table: String,
    pub state: TableState,
    /// DDL to run, in order.
    pub statements: Vec<String>,
    /// Snapshot to persist once the statements have run.
    pub snapshot: Snapshot,
}

impl InstallPlan {
    /// Returns `true` when the live table already matches the record.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The statements as one `;`-separated script, for review or manual
    /// application.
    pub fn to_sql(&self) -> String {
        self.statements
            .iter()
            .map(|statement| format!("{statement};\n"))
            .collect()
    }
}

/// Outcome of a successful [`Installer::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub table: String,
    /// The table was created by this call.
    pub created: bool,
    pub statements_applied: usize,
}

/// Creates and migrates record tables, keeping one snapshot per table in a
/// tracking table.
///
/// # Examples
///
/// ```no_run
/// # fn demo(db: &impl rowmap_store::Database) -> rowmap_store::Result<()> {
/// # use rowmap_core::{Fields, Object, Record};
/// # #[derive(Default, Fields, Record)]
/// # struct Event { #[field(flatten)] base: Object, #[field(index = "ASC")] kind: String }
/// use rowmap_store::{Installer, SchemaConfig};
///
/// let installer = Installer::new(db, "app_", SchemaConfig::default())?;
/// installer.open()?;
///
/// let plan = installer.plan(&Event::default())?;
/// print!("{}", plan.to_sql());
///
/// installer.install(&Event::default())?;
/// # Ok(())
/// # }
/// ```
pub struct Installer<'a, D: Database + ?Sized> {
    db: &'a D,
    prefix: String,
    config: SchemaConfig,
}

impl<'a, D: Database + ?Sized> Installer<'a, D> {
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`] or
    /// [`StoreError::InvalidTableName`] for names that cannot be quoted
    /// safely.
    pub fn new(db: &'a D, prefix: impl Into<String>, config: SchemaConfig) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        validate_table_name(&config.tracking_table)?;
        Ok(Self { db, prefix, config })
    }

    pub fn from_config(db: &'a D, config: &StoreConfig) -> Result<Self> {
        Self::new(db, config.prefix.clone(), config.schema.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Creates the tracking table if it does not exist.
    pub fn open(&self) -> Result<()> {
        let sql = tracking_table_sql(&self.config.tracking_table);
        debug!(sql = %sql, "Executing statement");
        self.db.exec(&sql, &[])?;
        Ok(())
    }

    /// Reads the stored snapshot of `table`.
    ///
    /// A row whose snapshot text cannot be parsed is returned with an empty
    /// snapshot, so the next install re-adds every column.
    pub fn snapshot(&self, table: &str) -> Result<Option<StoredSnapshot>> {
        let sql = format!("SELECT id, scheme FROM `{}` WHERE name=?", self.config.tracking_table);
        debug!(sql = %sql, table, "Running query");
        let mut rows = self.db.query(&sql, &[Value::from(table)])?;
        let Some(row) = rows.next() else {
            return Ok(None);
        };

        let id = row.get(0).and_then(Value::as_i64).unwrap_or(0);
        let text = row.get(1).and_then(Value::as_str).unwrap_or("");
        let snapshot = if text.trim().is_empty() {
            Snapshot::default()
        } else {
            Snapshot::from_json(text).unwrap_or_else(|e| {
                warn!(table, error = %e, "Unreadable schema snapshot, treating as empty");
                Snapshot::default()
            })
        };

        Ok(Some(StoredSnapshot {
            id,
            table: table.to_string(),
            snapshot,
        }))
    }

    /// Computes the statements needed for `record` without running them.
    pub fn plan<R: Record + 'static>(&self, record: &R) -> Result<InstallPlan> {
        let table = rowmap_core::table_name(&self.prefix, record);
        let fields = describe::<R>();
        let snapshot = Snapshot::from_fields(&fields);

        let plan = match self.snapshot(&table)? {
            None => InstallPlan {
                statements: vec![create_table_sql(&table, &fields, self.config.auto_increment)],
                state: TableState::Unregistered,
                table,
                snapshot,
            },
            Some(stored) => InstallPlan {
                statements: migration_sql(&table, &fields, &stored.snapshot),
                state: TableState::Registered {
                    snapshot_id: stored.id,
                },
                table,
                snapshot,
            },
        };
        Ok(plan)
    }

    /// Creates or migrates the table for `record` and records its new
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first failing statement's error. When
    /// [`SchemaConfig::snapshot_on_failure`] is set, the new snapshot is
    /// still written before the error is returned, so a re-run will not
    /// retry the failed statements.
    pub fn install<R: Record + 'static>(&self, record: &R) -> Result<InstallReport> {
        let plan = self.plan(record)?;
        if plan.is_empty() {
            debug!(table = %plan.table, "Schema up to date");
            return Ok(InstallReport {
                table: plan.table,
                created: false,
                statements_applied: 0,
            });
        }

        for (applied, statement) in plan.statements.iter().enumerate() {
            debug!(sql = %statement, "Executing statement");
            if let Err(err) = self.db.exec(statement, &[]) {
                self.recover(&plan, applied, &err);
                return Err(err);
            }
        }

        let json = plan.snapshot.to_json()?;
        match plan.state {
            TableState::Unregistered => self.insert_snapshot(&plan.table, &json)?,
            TableState::Registered { snapshot_id } => self.update_snapshot(snapshot_id, &json)?,
        }

        let created = plan.state == TableState::Unregistered;
        info!(
            table = %plan.table,
            created,
            statements = plan.statements.len(),
            "Schema installed"
        );
        Ok(InstallReport {
            table: plan.table,
            created,
            statements_applied: plan.statements.len(),
        })
    }

    fn recover(&self, plan: &InstallPlan, applied: usize, err: &StoreError) {
        if !self.config.snapshot_on_failure {
            warn!(
                table = %plan.table,
                applied,
                error = %err,
                "Schema install failed, snapshot left unchanged"
            );
            return;
        }

        warn!(
            table = %plan.table,
            applied,
            error = %err,
            "Schema install failed, recording new snapshot anyway"
        );
        if let Err(upsert_err) = self.upsert_snapshot(&plan.table, &plan.snapshot) {
            warn!(table = %plan.table, error = %upsert_err, "Snapshot upsert failed");
        }
    }

    fn upsert_snapshot(&self, table: &str, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        let sql = format!("SELECT id FROM `{}` WHERE name=?", self.config.tracking_table);
        debug!(sql = %sql, table, "Running query");
        let existing = self
            .db
            .query(&sql, &[Value::from(table)])?
            .next()
            .and_then(|row| row.get(0).and_then(Value::as_i64));

        match existing {
            Some(id) => self.update_snapshot(id, &json),
            None => self.insert_snapshot(table, &json),
        }
    }

    fn insert_snapshot(&self, table: &str, json: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO `{}`(`name`,`scheme`) VALUES (?,?)",
            self.config.tracking_table
        );
        debug!(sql = %sql, table, "Executing statement");
        self.db.exec(&sql, &[Value::from(table), Value::from(json)])?;
        Ok(())
    }

    fn update_snapshot(&self, id: i64, json: &str) -> Result<()> {
        let sql = format!("UPDATE `{}` SET `scheme`=? WHERE id=?", self.config.tracking_table);
        debug!(sql = %sql, id, "Executing statement");
        self.db.exec(&sql, &[Value::from(json), Value::Integer(id)])?;
        Ok(())
    }
}
