//! Record service.
//!
//! Sits between the HTTP adapter and the [`RecordStore`]. It owns the one
//! piece of business validation (required-field presence), parses path
//! identifiers and classifies store outcomes so the adapter can choose how
//! to present them.
//!
//! # Outcomes
//!
//! | Operation | Success | Failure |
//! |-----------|---------|---------|
//! | `list_records` | `ListOutcome::Records` | `ListOutcome::Empty`, `ListOutcome::StoreFailure` |
//! | `get_record` | `Record` | `Error::NotFound` (missing row, bad id, store error) |
//! | `create_record` | `Record` with generated id | `Error::InvalidInput`, `Error::OperationFailed` |

use std::sync::Arc;

use tracing::instrument;

use crate::models::{NewRecord, Record, RecordId};
use crate::storage::RecordStore;
use crate::{Error, Result};

/// Validation rules applied on create beyond required-field presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Reject latitudes outside [-90, 90], longitudes outside [-180, 180]
    /// and non-finite coordinates. Off by default, so any value is accepted.
    pub strict_coordinates: bool,
}

/// Result of listing records.
///
/// Keeps "no rows" and "query failed" apart; the adapter decides whether
/// they collapse into one response.
#[derive(Debug)]
pub enum ListOutcome {
    /// At least one record.
    Records(Vec<Record>),
    /// The table has no rows.
    Empty,
    /// The query failed.
    StoreFailure(Error),
}

impl ListOutcome {
    /// Returns the records, treating `Empty` as an empty list.
    ///
    /// # Errors
    ///
    /// Returns the store error for `StoreFailure`.
    pub fn into_result(self) -> Result<Vec<Record>> {
        match self {
            Self::Records(records) => Ok(records),
            Self::Empty => Ok(Vec::new()),
            Self::StoreFailure(e) => Err(e),
        }
    }
}

/// Service for creating and reading check-in records.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    policy: ValidationPolicy,
}

impl RecordService {
    /// Creates a new record service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            policy: ValidationPolicy::default(),
        }
    }

    /// Sets the validation policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the active validation policy.
    #[must_use]
    pub const fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Lists every stored record.
    #[instrument(skip(self))]
    pub fn list_records(&self) -> ListOutcome {
        match self.store.find_all() {
            Ok(records) if records.is_empty() => ListOutcome::Empty,
            Ok(records) => {
                tracing::debug!(count = records.len(), "Listed records");
                ListOutcome::Records(records)
            },
            Err(e) => {
                tracing::warn!(error = %e, "Listing records failed");
                ListOutcome::StoreFailure(e)
            },
        }
    }

    /// Looks up a record by the id text taken from a request path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id is not an integer, when no row
    /// matches, and when the store query fails.
    #[instrument(skip(self))]
    pub fn get_record(&self, id_text: &str) -> Result<Record> {
        let id: RecordId = id_text.parse()?;

        match self.store.find_by_id(id) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(Error::NotFound(format!("log {id}"))),
            Err(e) => {
                tracing::warn!(log_id = %id, error = %e, "Record lookup failed");
                Err(Error::NotFound(format!("log {id}")))
            },
        }
    }

    /// Validates and stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if validation fails, or the store error
    /// if the insert fails.
    #[instrument(skip(self, candidate), fields(venue_id = %candidate.venue_id))]
    pub fn create_record(&self, candidate: NewRecord) -> Result<Record> {
        if let Err(e) = self.validate(&candidate) {
            metrics::counter!("geolog_validation_failures_total").increment(1);
            return Err(e);
        }

        let id = self.store.insert(&candidate).inspect_err(|e| {
            tracing::error!(error = %e, "Insert failed");
        })?;

        metrics::counter!("geolog_records_created_total").increment(1);
        tracing::info!(log_id = %id, "Record created");
        Ok(candidate.into_record(id))
    }

    /// Decodes a JSON request body and creates the record it describes.
    ///
    /// A body that fails to decode is rejected exactly like a candidate
    /// with empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for undecodable bodies and failed
    /// validation, or the store error if the insert fails.
    pub fn create_record_from_json(&self, body: &[u8]) -> Result<Record> {
        let candidate = NewRecord::from_json(body).inspect_err(|e| {
            metrics::counter!("geolog_validation_failures_total").increment(1);
            tracing::debug!(error = %e, "Rejected undecodable record body");
        })?;
        self.create_record(candidate)
    }

    /// Applies required-field and coordinate checks to a candidate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first failed check.
    pub fn validate(&self, candidate: &NewRecord) -> Result<()> {
        if candidate.venue_id.is_empty() {
            return Err(Error::InvalidInput("venue_id is empty".to_string()));
        }

        if self.policy.strict_coordinates {
            if !candidate.latitude.is_finite() || !(-90.0..=90.0).contains(&candidate.latitude) {
                return Err(Error::InvalidInput(format!(
                    "latitude {} is outside [-90, 90]",
                    candidate.latitude
                )));
            }
            if !candidate.longitude.is_finite()
                || !(-180.0..=180.0).contains(&candidate.longitude)
            {
                return Err(Error::InvalidInput(format!(
                    "longitude {} is outside [-180, 180]",
                    candidate.longitude
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::RecordStoreFactory;
    use chrono::{TimeZone, Utc};
    use test_case::test_case;

    /// Store whose every statement fails.
    struct FailingStore;

    impl RecordStore for FailingStore {
        fn ensure_schema(&self) -> Result<()> {
            Ok(())
        }

        fn insert(&self, _record: &NewRecord) -> Result<RecordId> {
            Err(Error::operation("insert_log", "database is locked"))
        }

        fn find_all(&self) -> Result<Vec<Record>> {
            Err(Error::operation("select_logs", "database is locked"))
        }

        fn find_by_id(&self, _id: RecordId) -> Result<Option<Record>> {
            Err(Error::operation("select_log", "database is locked"))
        }

        fn count(&self) -> Result<u64> {
            Err(Error::operation("count_logs", "database is locked"))
        }
    }

    fn create_test_service() -> RecordService {
        let store = RecordStoreFactory::create_in_memory().expect("Failed to create store");
        RecordService::new(store)
    }

    fn candidate(venue: &str) -> NewRecord {
        let logged_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        NewRecord::new(logged_at, 30.27, -97.74, venue)
    }

    #[test]
    fn test_create_then_get_returns_same_fields() {
        let service = create_test_service();

        let created = service
            .create_record(candidate("gopher-venue"))
            .expect("create");
        assert!(created.id.get() > 0);

        let fetched = service
            .get_record(&created.id.to_string())
            .expect("get");
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_create_rejects_empty_venue_and_persists_nothing() {
        let store = RecordStoreFactory::create_in_memory().unwrap();
        let service = RecordService::new(Arc::clone(&store));

        let result = service.create_record(candidate(""));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test_case(b"" ; "empty body")]
    #[test_case(b"{}" ; "empty object")]
    #[test_case(b"not json" ; "garbage")]
    #[test_case(br#"{"logtime":"yesterday","latitude":1,"longitude":2,"venue_id":"v"}"# ; "bad timestamp")]
    #[test_case(br#"{"logtime":"2024-01-01T00:00:00Z","latitude":1,"longitude":2,"venue_id":""}"# ; "empty venue")]
    fn test_create_from_json_rejects(body: &[u8]) {
        let service = create_test_service();
        let result = service.create_record_from_json(body);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_create_from_json_accepts_full_body() {
        let service = create_test_service();
        let body = br#"{"logtime":"2024-01-01T00:00:00Z","latitude":30.27,"longitude":-97.74,"venue_id":"gopher-venue"}"#;
        let created = service.create_record_from_json(body).expect("create");
        assert_eq!(created.venue_id, "gopher-venue");
    }

    #[test_case("999999" ; "missing row")]
    #[test_case("abc" ; "not a number")]
    #[test_case("" ; "empty")]
    #[test_case("1.0" ; "fractional")]
    fn test_get_record_not_found(id_text: &str) {
        let service = create_test_service();
        assert!(matches!(
            service.get_record(id_text),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_get_record_collapses_store_errors_to_not_found() {
        let service = RecordService::new(Arc::new(FailingStore));
        assert!(matches!(service.get_record("1"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_records_outcomes() {
        let service = create_test_service();
        assert!(matches!(service.list_records(), ListOutcome::Empty));

        for venue in ["a", "b", "c"] {
            service.create_record(candidate(venue)).unwrap();
        }
        let ListOutcome::Records(records) = service.list_records() else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 3);

        let failing = RecordService::new(Arc::new(FailingStore));
        assert!(matches!(
            failing.list_records(),
            ListOutcome::StoreFailure(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_list_outcome_into_result() {
        assert!(ListOutcome::Empty.into_result().unwrap().is_empty());
        assert!(
            ListOutcome::StoreFailure(Error::operation("select_logs", "boom"))
                .into_result()
                .is_err()
        );
    }

    #[test]
    fn test_create_surfaces_store_failure() {
        let service = RecordService::new(Arc::new(FailingStore));
        assert!(matches!(
            service.create_record(candidate("v")),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_default_policy_accepts_any_coordinates() {
        let service = create_test_service();
        let mut wild = candidate("far-away");
        wild.latitude = 123.0;
        wild.longitude = -500.0;
        assert!(service.create_record(wild).is_ok());
    }

    #[test_case(91.0, 0.0 ; "latitude too high")]
    #[test_case(-90.5, 0.0 ; "latitude too low")]
    #[test_case(0.0, 180.5 ; "longitude too high")]
    #[test_case(f64::NAN, 0.0 ; "nan latitude")]
    #[test_case(0.0, f64::INFINITY ; "infinite longitude")]
    fn test_strict_policy_rejects(latitude: f64, longitude: f64) {
        let service = create_test_service().with_policy(ValidationPolicy {
            strict_coordinates: true,
        });
        let mut record = candidate("strict");
        record.latitude = latitude;
        record.longitude = longitude;
        assert!(matches!(
            service.create_record(record),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_strict_policy_accepts_bounds() {
        let service = create_test_service().with_policy(ValidationPolicy {
            strict_coordinates: true,
        });
        let mut record = candidate("edge");
        record.latitude = -90.0;
        record.longitude = 180.0;
        assert!(service.create_record(record).is_ok());
    }
}
