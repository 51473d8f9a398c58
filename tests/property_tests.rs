//! Property-based tests for record handling.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Created records read back with identical fields
//! - N creates yield N distinct ascending ids
//! - Id text that is not an integer never resolves

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use geolog::{Error, NewRecord, RecordService, RecordStoreFactory};
use proptest::prelude::*;

fn service() -> RecordService {
    RecordService::new(RecordStoreFactory::create_in_memory().unwrap())
}

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // 1970..2100, millisecond precision
    (0i64..4_102_444_800_000).prop_map(|ms| DateTime::from_timestamp_millis(ms).unwrap())
}

fn new_record() -> impl Strategy<Value = NewRecord> {
    (
        timestamp(),
        -90.0f64..=90.0,
        -180.0f64..=180.0,
        "[a-zA-Z0-9_-]{1,40}",
    )
        .prop_map(|(logged_at, latitude, longitude, venue_id)| {
            NewRecord::new(logged_at, latitude, longitude, venue_id)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: a created record reads back identically.
    #[test]
    fn prop_create_then_get_roundtrips(candidate in new_record()) {
        let service = service();
        let created = service.create_record(candidate.clone()).unwrap();
        let fetched = service.get_record(&created.id.to_string()).unwrap();

        prop_assert_eq!(&fetched, &created);
        prop_assert_eq!(fetched.logged_at, candidate.logged_at);
        prop_assert_eq!(fetched.venue_id, candidate.venue_id);
    }

    /// Property: N creates list back as N records with ascending ids.
    #[test]
    fn prop_ids_are_distinct_and_ascending(candidates in prop::collection::vec(new_record(), 1..20)) {
        let service = service();
        for candidate in &candidates {
            service.create_record(candidate.clone()).unwrap();
        }

        let records = service.list_records().into_result().unwrap();
        prop_assert_eq!(records.len(), candidates.len());
        prop_assert!(records.windows(2).all(|w| w[0].id.get() < w[1].id.get()));
    }

    /// Property: non-integer id text is always not-found.
    #[test]
    fn prop_non_numeric_id_is_not_found(id in "[a-zA-Z][a-zA-Z0-9]{0,12}") {
        let service = service();
        prop_assert!(matches!(service.get_record(&id), Err(Error::NotFound(_))));
    }

    /// Property: any whitespace-free venue id is accepted, the empty one never.
    #[test]
    fn prop_only_empty_venue_is_rejected(mut candidate in new_record()) {
        let service = service();
        prop_assert!(service.validate(&candidate).is_ok());

        candidate.venue_id.clear();
        prop_assert!(matches!(service.validate(&candidate), Err(Error::InvalidInput(_))));
    }
}
