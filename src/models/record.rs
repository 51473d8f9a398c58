//! Check-in records and their identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Store-assigned identifier for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wraps a raw database identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    /// Parses a decimal identifier as it appears in a request path.
    fn from_str(s: &str) -> Result<Self> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|e| Error::NotFound(format!("log '{s}' ({e})")))
    }
}

/// A single geolocation check-in event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the store at creation.
    pub id: RecordId,
    /// When the check-in happened.
    #[serde(rename = "logtime")]
    pub logged_at: DateTime<Utc>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Venue identifier.
    pub venue_id: String,
}

/// A record that has not been stored yet.
///
/// This is the body accepted by `POST /api/v1/logs`. All four fields are
/// required; an `id` in the body is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// When the check-in happened.
    #[serde(rename = "logtime")]
    pub logged_at: DateTime<Utc>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Venue identifier.
    pub venue_id: String,
}

impl NewRecord {
    /// Creates a new candidate record.
    #[must_use]
    pub fn new(
        logged_at: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        venue_id: impl Into<String>,
    ) -> Self {
        Self {
            logged_at,
            latitude,
            longitude,
            venue_id: venue_id.into(),
        }
    }

    /// Decodes a candidate from a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the body is not a JSON object with
    /// every required field.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::InvalidInput(e.to_string()))
    }

    /// Attaches the store-generated identifier.
    #[must_use]
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            logged_at: self.logged_at,
            latitude: self.latitude,
            longitude: self.longitude,
            venue_id: self.venue_id,
        }
    }
}
