//! Record store trait definition.

use crate::Result;
use crate::models::{NewRecord, Record, RecordId};

/// Trait for record storage backends.
///
/// Owns the `log` table and the SQL issued against it. Each method maps to
/// a single statement; there are no multi-statement transactions.
/// Implementations must be thread-safe (`Send + Sync`).
pub trait RecordStore: Send + Sync {
    /// Creates the backing table if it does not exist.
    ///
    /// Idempotent. Called once during startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unusable or the DDL fails.
    fn ensure_schema(&self) -> Result<()>;

    /// Persists a new record and returns the store-generated identifier.
    ///
    /// # Errors
    ///
    /// Returns an error on any storage-layer failure.
    fn insert(&self, record: &NewRecord) -> Result<RecordId>;

    /// Returns every stored record, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    fn find_all(&self) -> Result<Vec<Record>>;

    /// Returns the record with the given id, or `None` if no row matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded.
    fn find_by_id(&self, id: RecordId) -> Result<Option<Record>>;

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn count(&self) -> Result<u64>;

    /// Returns the backend name used in logs and metrics.
    fn backend_name(&self) -> &'static str {
        "unknown"
    }
}
