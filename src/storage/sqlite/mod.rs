//! `SQLite` record store.
//!
//! ## Module Structure
//!
//! - `connection`: lock acquisition with poison recovery, pragma configuration
//! - `metrics`: per-operation counters and latency histograms
//! - `record_store`: the [`SqliteRecordStore`] itself

mod connection;
mod metrics;
mod record_store;

pub use connection::{DEFAULT_BUSY_TIMEOUT, acquire_lock, configure_connection};
pub use record_store::SqliteRecordStore;
