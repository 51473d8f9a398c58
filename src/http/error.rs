//! Status-code policy and JSON error bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body for `GET /api/v1/logs` when nothing can be listed.
pub const LIST_EMPTY_MESSAGE: &str = "no log(s) into the table";
/// Body for `GET /api/v1/logs/{id}` misses.
pub const NOT_FOUND_MESSAGE: &str = "log not found";
/// Body for rejected creates.
pub const FIELDS_EMPTY_MESSAGE: &str = "fields are empty";
/// Body for store failures under [`ErrorPolicy::Distinct`].
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// How store failures and empty results map to status codes.
///
/// | Situation | `Faithful` | `Distinct` |
/// |-----------|------------|------------|
/// | list, no rows | 404 | 200 `[]` |
/// | list, store error | 404 | 500 |
/// | create, store error | 422 | 500 |
///
/// Get-by-id answers 404 for every failure under both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Collapse empty results and store failures into 404/422.
    #[default]
    Faithful,
    /// Report empty lists as 200 and store failures as 500.
    Distinct,
}

impl ErrorPolicy {
    /// Parses a policy name, case-insensitively.
    #[must_use]
    pub fn try_parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "faithful" => Some(Self::Faithful),
            "distinct" => Some(Self::Distinct),
            _ => None,
        }
    }

    /// Parses a policy name; anything unrecognised logs a warning and
    /// selects `Faithful`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or_else(|| {
            tracing::warn!(
                value = s,
                fallback = Self::Faithful.as_str(),
                "Unknown error policy"
            );
            Self::Faithful
        })
    }

    /// Returns the policy name as written in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Faithful => "faithful",
            Self::Distinct => "distinct",
        }
    }
}

/// An HTTP error response: a status code and a `{"error": ...}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    /// 404 for an empty or failed list.
    #[must_use]
    pub const fn list_empty() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: LIST_EMPTY_MESSAGE,
        }
    }

    /// 404 for a missing record.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: NOT_FOUND_MESSAGE,
        }
    }

    /// 422 for a rejected create.
    #[must_use]
    pub const fn fields_empty() -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: FIELDS_EMPTY_MESSAGE,
        }
    }

    /// 500 for a store failure.
    #[must_use]
    pub const fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: INTERNAL_MESSAGE,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
