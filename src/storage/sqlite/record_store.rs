//! `SQLite` implementation of [`RecordStore`].

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::instrument;

use super::connection::{DEFAULT_BUSY_TIMEOUT, acquire_lock, configure_connection};
use super::metrics::{record_operation_metrics, status_label};
use crate::models::{NewRecord, Record, RecordId};
use crate::storage::traits::RecordStore;
use crate::{Error, Result};

const BACKEND: &str = "sqlite";

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS log (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        logtime   DATETIME NOT NULL,
        latitude  REAL NOT NULL,
        longitude REAL NOT NULL,
        venue_id  TEXT NOT NULL
    );
";

const INSERT_RECORD: &str =
    "INSERT INTO log (logtime, latitude, longitude, venue_id) VALUES (?1, ?2, ?3, ?4)";

const SELECT_ALL: &str =
    "SELECT id, logtime, latitude, longitude, venue_id FROM log ORDER BY id ASC";

const SELECT_BY_ID: &str =
    "SELECT id, logtime, latitude, longitude, venue_id FROM log WHERE id = ?1";

/// SQLite-backed record store.
///
/// Holds a single connection behind a mutex; every trait method is one
/// statement executed while the lock is held.
pub struct SqliteRecordStore {
    /// Database connection (mutex for interior mutability).
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (or creates) a database file with the default busy timeout.
    ///
    /// The schema is not created here; call [`RecordStore::ensure_schema`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens (or creates) a database file with an explicit busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or configured.
    pub fn with_busy_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::operation("open_log_database", format!("{}: {e}", path.display()))
        })?;
        configure_connection(&conn, busy_timeout)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::operation("open_log_database_memory", e))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Formats a timestamp the way it is stored in the `logtime` column.
    fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Decodes one `log` row.
    fn parse_record_row(row: &Row<'_>) -> rusqlite::Result<Record> {
        let logtime: String = row.get(1)?;
        let logged_at = DateTime::parse_from_rfc3339(&logtime)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        Ok(Record {
            id: RecordId::new(row.get(0)?),
            logged_at,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            venue_id: row.get(4)?,
        })
    }

    fn find_all_inner(conn: &Connection) -> rusqlite::Result<Vec<Record>> {
        let mut stmt = conn.prepare(SELECT_ALL)?;
        let rows = stmt.query_map([], Self::parse_record_row)?;
        rows.collect()
    }
}

impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self))]
    fn ensure_schema(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(CREATE_TABLE)
            .map_err(|e| Error::operation("initialize_log_schema", e))
    }

    #[instrument(skip(self, record), fields(venue_id = %record.venue_id))]
    fn insert(&self, record: &NewRecord) -> Result<RecordId> {
        let start = Instant::now();
        let conn = acquire_lock(&self.conn);

        let result = conn
            .execute(
                INSERT_RECORD,
                params![
                    Self::to_db_timestamp(&record.logged_at),
                    record.latitude,
                    record.longitude,
                    record.venue_id,
                ],
            )
            .map(|_| RecordId::new(conn.last_insert_rowid()))
            .map_err(|e| Error::operation("insert_log", e));

        record_operation_metrics(BACKEND, "insert", start, status_label(&result));
        result
    }

    #[instrument(skip(self))]
    fn find_all(&self) -> Result<Vec<Record>> {
        let start = Instant::now();
        let conn = acquire_lock(&self.conn);

        let result = Self::find_all_inner(&conn).map_err(|e| Error::operation("select_logs", e));

        record_operation_metrics(BACKEND, "find_all", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(log_id = %id))]
    fn find_by_id(&self, id: RecordId) -> Result<Option<Record>> {
        let start = Instant::now();
        let conn = acquire_lock(&self.conn);

        let result = conn
            .query_row(SELECT_BY_ID, params![id.get()], Self::parse_record_row)
            .optional()
            .map_err(|e| Error::operation("select_log", e));

        record_operation_metrics(BACKEND, "find_by_id", start, status_label(&result));
        result
    }

    fn count(&self) -> Result<u64> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM log", [], |row| row.get(0))
            .map_err(|e| Error::operation("count_logs", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_store() -> SqliteRecordStore {
        let store = SqliteRecordStore::in_memory().expect("Failed to create store");
        store.ensure_schema().expect("Failed to create schema");
        store
    }

    fn sample(venue: &str) -> NewRecord {
        let logged_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        NewRecord::new(logged_at, 30.27, -97.74, venue)
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = create_store();
        store.ensure_schema().expect("second ensure_schema");
        store.ensure_schema().expect("third ensure_schema");
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_then_find_by_id() {
        let store = create_store();
        let candidate = sample("gopher-venue");

        let id = store.insert(&candidate).expect("insert");
        assert!(id.get() > 0);

        let found = store
            .find_by_id(id)
            .expect("find_by_id")
            .expect("record should exist");
        assert_eq!(found, candidate.into_record(id));
    }

    #[test]
    fn test_find_by_id_missing_returns_none() {
        let store = create_store();
        assert!(store.find_by_id(RecordId::new(999_999)).unwrap().is_none());
    }

    #[test]
    fn test_find_all_is_ordered_by_id() {
        let store = create_store();
        let ids: Vec<RecordId> = ["a", "b", "c"]
            .iter()
            .map(|v| store.insert(&sample(v)).unwrap())
            .collect();

        let all = store.find_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
        assert_eq!(all[1].venue_id, "b");
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_subsecond_timestamps_round_trip() {
        let store = create_store();
        let logged_at = Utc
            .with_ymd_and_hms(2023, 6, 15, 12, 30, 45)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(250))
            .unwrap();
        let candidate = NewRecord::new(logged_at, 0.0, 0.0, "ms");

        let id = store.insert(&candidate).unwrap();
        let found = store.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.logged_at, logged_at);
    }

    #[test]
    fn test_corrupt_logtime_is_a_store_error() {
        let store = create_store();
        {
            let conn = acquire_lock(&store.conn);
            conn.execute(
                "INSERT INTO log (logtime, latitude, longitude, venue_id) VALUES ('yesterday', 1.0, 2.0, 'bad')",
                [],
            )
            .unwrap();
        }

        assert!(matches!(
            store.find_all(),
            Err(Error::OperationFailed { ref operation, .. }) if operation == "select_logs"
        ));
        assert!(store.find_by_id(RecordId::new(1)).is_err());
    }

    #[test]
    fn test_missing_table_is_a_store_error() {
        let store = SqliteRecordStore::in_memory().unwrap();
        assert!(store.insert(&sample("x")).is_err());
        assert!(store.find_all().is_err());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("geolog.db");

        let id = {
            let store = SqliteRecordStore::new(&path).unwrap();
            store.ensure_schema().unwrap();
            store.insert(&sample("durable")).unwrap()
        };

        let reopened = SqliteRecordStore::new(&path).unwrap();
        reopened.ensure_schema().unwrap();
        let found = reopened.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.venue_id, "durable");
    }
}
