//! Business logic services.
//!
//! Services orchestrate the store and apply validation; they know nothing
//! about HTTP.

mod record;

pub use record::{ListOutcome, RecordService, ValidationPolicy};
