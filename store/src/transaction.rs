//! All-or-nothing execution of several statements.

use tracing::{debug, warn};

use crate::db::Database;
use crate::error::Result;

/// A transaction-scoped database view that must be finished explicitly.
pub trait TransactionHandle: Database + Sized {
    fn commit(self) -> Result<()>;
    fn rollback(self) -> Result<()>;
}

/// A database that can open transactions.
pub trait Transactional {
    type Transaction<'t>: TransactionHandle
    where
        Self: 't;

    fn begin(&mut self) -> Result<Self::Transaction<'_>>;
}

/// Runs `f` inside a transaction on `db`.
///
/// The transaction is committed when `f` returns `Ok` and rolled back when
/// it returns `Err`; the closure's error is returned unchanged. A failed
/// rollback is logged, not reported.
pub fn transaction<D, T, F>(db: &mut D, f: F) -> Result<T>
where
    D: Transactional,
    F: FnOnce(&dyn Database) -> Result<T>,
{
    let tx = db.begin()?;
    match f(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "Rollback failed");
            } else {
                debug!(error = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}
