//! Route handlers for `/api/v1/logs`.
//!
//! Store calls block, so each handler moves its service call onto the
//! blocking pool and carries the request id across.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::error::{ApiError, ErrorPolicy};
use crate::observability::{RequestContext, current_request_id, enter_request_context};
use crate::services::{ListOutcome, RecordService};
use crate::{Error, Record, Result};

/// Runs a service call on the blocking pool under the caller's request id.
async fn run_blocking<T, F>(service: &Arc<RecordService>, f: F) -> Result<T>
where
    F: FnOnce(&RecordService) -> T + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(service);
    let request_id = current_request_id();

    tokio::task::spawn_blocking(move || {
        let _guard = request_id.map(|id| enter_request_context(RequestContext::from_id(id)));
        f(&service)
    })
    .await
    .map_err(|e| Error::operation("blocking_task", e))
}

// ═══════════════════════════════════════════════════════════════
//  GET /api/v1/logs
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn list_logs(State(state): State<AppState>) -> Response {
    let outcome = run_blocking(&state.service, RecordService::list_records)
        .await
        .unwrap_or_else(ListOutcome::StoreFailure);

    match (outcome, state.policy) {
        (ListOutcome::Records(records), _) => (StatusCode::OK, Json(records)).into_response(),
        (ListOutcome::Empty, ErrorPolicy::Distinct) => {
            (StatusCode::OK, Json(Vec::<Record>::new())).into_response()
        },
        (ListOutcome::Empty | ListOutcome::StoreFailure(_), ErrorPolicy::Faithful) => {
            ApiError::list_empty().into_response()
        },
        (ListOutcome::StoreFailure(_), ErrorPolicy::Distinct) => {
            ApiError::internal().into_response()
        },
    }
}

// ═══════════════════════════════════════════════════════════════
//  GET /api/v1/logs/{id}
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn get_log(
    State(state): State<AppState>,
    id: std::result::Result<Path<String>, PathRejection>,
) -> Response {
    // An id segment that does not decode is just another miss.
    let Ok(Path(id)) = id else {
        return ApiError::not_found().into_response();
    };

    let result = run_blocking(&state.service, move |service| service.get_record(&id))
        .await
        .and_then(|inner| inner);

    match result {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(_) => ApiError::not_found().into_response(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  POST /api/v1/logs
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn create_log(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    // Unreadable or oversized bodies are rejected like undecodable ones.
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected unreadable record body");
            return ApiError::fields_empty().into_response();
        },
    };

    let result = run_blocking(&state.service, move |service| {
        service.create_record_from_json(&body)
    })
    .await
    .and_then(|inner| inner);

    match (result, state.policy) {
        (Ok(record), _) => (StatusCode::CREATED, Json(record)).into_response(),
        (Err(Error::InvalidInput(_)), _) | (Err(_), ErrorPolicy::Faithful) => {
            ApiError::fields_empty().into_response()
        },
        (Err(_), ErrorPolicy::Distinct) => ApiError::internal().into_response(),
    }
}
