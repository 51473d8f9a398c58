//! Storage layer for check-in records.
//!
//! Records live in a single relational table named `log`. The
//! [`RecordStore`] trait is the seam between the service layer and the
//! database; [`SqliteRecordStore`] is the production implementation.

// Dropping the connection guard a few statements early buys nothing here.
#![allow(clippy::significant_drop_tightening)]

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteRecordStore;
pub use traits::RecordStore;

use std::path::Path;
use std::sync::Arc;

use crate::Result;
use crate::config::DatabaseSettings;

/// Path value that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Factory for creating record stores.
///
/// Every store returned by the factory has already had its schema ensured,
/// so it is ready to serve requests.
pub struct RecordStoreFactory;

impl RecordStoreFactory {
    /// Opens the store described by the database settings.
    ///
    /// A path of `:memory:` selects an ephemeral in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created. Callers at startup treat this as fatal.
    pub fn open(settings: &DatabaseSettings) -> Result<Arc<dyn RecordStore>> {
        let store = if settings.path == Path::new(IN_MEMORY_PATH) {
            SqliteRecordStore::in_memory()?
        } else {
            SqliteRecordStore::with_busy_timeout(&settings.path, settings.busy_timeout())?
        };
        store.ensure_schema()?;
        tracing::info!(
            path = %settings.path.display(),
            "Record store ready"
        );
        Ok(Arc::new(store))
    }

    /// Creates a file-backed store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn create_with_path(path: impl AsRef<Path>) -> Result<Arc<dyn RecordStore>> {
        let store = SqliteRecordStore::new(path)?;
        store.ensure_schema()?;
        Ok(Arc::new(store))
    }

    /// Creates an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn create_in_memory() -> Result<Arc<dyn RecordStore>> {
        let store = SqliteRecordStore::in_memory()?;
        store.ensure_schema()?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory() {
        let store = RecordStoreFactory::create_in_memory().expect("in-memory store");
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn test_create_with_path() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let db_path = dir.path().join("geolog.db");

        let storage = RecordStoreFactory::create_with_path(&db_path);
        assert!(storage.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_with_memory_path() {
        let settings = DatabaseSettings {
            path: IN_MEMORY_PATH.into(),
            ..DatabaseSettings::default()
        };
        let store = RecordStoreFactory::open(&settings).expect("open");
        assert!(store.find_all().expect("find_all").is_empty());
    }

    #[test]
    fn test_open_fails_for_unusable_path() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let settings = DatabaseSettings {
            path: dir.path().join("missing").join("nested").join("geolog.db"),
            ..DatabaseSettings::default()
        };
        assert!(RecordStoreFactory::open(&settings).is_err());
    }
}
