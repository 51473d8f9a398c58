//! File-backed record store integration tests.
//!
//! Exercises the `SQLite` store through the factory the binary uses:
//! - Schema creation on a fresh file
//! - Persistence across reopen
//! - Concurrent inserts through a shared handle

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use geolog::config::DatabaseSettings;
use geolog::{ListOutcome, NewRecord, RecordService, RecordStoreFactory, ValidationPolicy};
use tempfile::TempDir;

fn settings(dir: &TempDir) -> DatabaseSettings {
    DatabaseSettings {
        path: dir.path().join("geolog.db"),
        busy_timeout_ms: 2000,
    }
}

fn candidate(venue_id: &str) -> NewRecord {
    NewRecord::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 15, 0).unwrap(),
        52.52,
        13.405,
        venue_id,
    )
}

#[test]
fn test_open_creates_database_file() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);

    let store = RecordStoreFactory::open(&settings).expect("open");
    assert!(settings.path.exists());
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.backend_name(), "sqlite");
}

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);

    let created = {
        let service = RecordService::new(RecordStoreFactory::open(&settings).unwrap());
        service.create_record(candidate("berlin-1")).unwrap()
    };

    let service = RecordService::new(RecordStoreFactory::open(&settings).unwrap());
    let fetched = service.get_record(&created.id.to_string()).unwrap();
    assert_eq!(fetched, created);

    match service.list_records() {
        ListOutcome::Records(records) => assert_eq!(records, vec![created]),
        other => panic!("expected records, got {other:?}"),
    }
}

#[test]
fn test_concurrent_inserts_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let store = RecordStoreFactory::open(&settings(&dir)).unwrap();
    let service = Arc::new(RecordService::new(store));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                (0..10)
                    .map(|j| {
                        service
                            .create_record(candidate(&format!("venue-{i}-{j}")))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 80);

    let records = service.list_records().into_result().unwrap();
    assert_eq!(records.len(), 80);
    assert!(records.windows(2).all(|w| w[0].id.get() < w[1].id.get()));
}

#[test]
fn test_strict_policy_rejects_out_of_range_before_insert() {
    let dir = TempDir::new().unwrap();
    let store = RecordStoreFactory::open(&settings(&dir)).unwrap();
    let service = RecordService::new(Arc::clone(&store)).with_policy(ValidationPolicy {
        strict_coordinates: true,
    });

    let mut bad = candidate("v");
    bad.latitude = 91.0;
    assert!(service.create_record(bad).is_err());
    assert_eq!(store.count().unwrap(), 0);
}
