//! # Geolog
//!
//! A small HTTP service that records geolocation check-in events.
//!
//! Each event (a [`Record`]) carries a timestamp, a latitude/longitude pair
//! and a venue identifier. Records are persisted in a single relational
//! table and served back over a JSON API rooted at `/api/v1/logs`.
//!
//! ## Layers
//!
//! - [`storage`]: the [`RecordStore`] trait and its `SQLite` implementation
//! - [`services`]: [`RecordService`], validation and orchestration
//! - [`http`]: the axum router that maps service outcomes to status codes
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use geolog::{RecordService, RecordStoreFactory};
//!
//! let store = RecordStoreFactory::create_in_memory()?;
//! let service = Arc::new(RecordService::new(store));
//! let app = geolog::http::router(service, geolog::http::ErrorPolicy::Faithful);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod http;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::GeologConfig;
pub use models::{NewRecord, Record, RecordId};
pub use services::{ListOutcome, RecordService, ValidationPolicy};
pub use storage::{RecordStore, RecordStoreFactory, SqliteRecordStore};

/// Error type for geolog operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty `venue_id`, malformed request body, out-of-range coordinates (strict mode) |
/// | `NotFound` | No row for an id, or the id text is not an integer |
/// | `OperationFailed` | Database, configuration or listener failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements fail or rows cannot be decoded
    /// - The configuration file cannot be read or parsed
    /// - The HTTP listener cannot bind
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for geolog operations.
pub type Result<T> = std::result::Result<T, Error>;
