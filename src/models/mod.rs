//! Data models for geolog.

mod record;

pub use record::{NewRecord, Record, RecordId};
