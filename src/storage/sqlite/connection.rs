//! Connection handling for the `SQLite` record store.
//!
//! The store keeps one [`Connection`] behind a [`Mutex`]. `SQLite` WAL mode
//! lets readers proceed while a writer holds the lock, and the busy timeout
//! makes contending statements wait instead of failing with `SQLITE_BUSY`.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Busy timeout applied when none is configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Acquires a mutex lock, recovering from poison.
///
/// A panic while the lock was held leaves the connection itself intact,
/// so the inner value is recovered and a warning is logged.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("geolog_sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a file-backed connection.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers alongside a single writer
/// - **NORMAL synchronous**: durability/performance balance suited to WAL
/// - **`busy_timeout`**: wait for locks instead of failing immediately
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the busy timeout cannot be set,
/// which means the connection is not usable.
pub fn configure_connection(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    // journal_mode answers with a row ("wal" or "memory"), so the result is
    // ignored rather than treated as an error.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.busy_timeout(busy_timeout)
        .map_err(|e| Error::operation("configure_connection", e))
}
