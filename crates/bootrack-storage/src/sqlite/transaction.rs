//! Transaction scope for [`SqliteStore`].

use rusqlite::Transaction;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

impl SqliteStore {
    /// Runs `f` inside a database transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls everything back, so a
    /// mutating call either fully applies or leaves no trace.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        // Rolled back on drop if `f` fails.
        let value = f(&tx)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(value)
    }
}
