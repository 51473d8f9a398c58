//! Request-id propagation and per-route metrics.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::observability::{RequestContext, scope_request_context};

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request id that is reused as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuses or generates a request id, scopes it over the request and echoes
/// it in the response.
pub(crate) async fn propagate_request_id(request: Request, next: Next) -> Response {
    let context = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(RequestContext::new, |id| RequestContext::from_id(id));

    let header_value = HeaderValue::from_str(context.request_id()).ok();
    let span = tracing::info_span!(
        "request",
        request_id = %context.request_id(),
        method = %request.method(),
        uri = %request.uri(),
    );

    let mut response = scope_request_context(context, next.run(request))
        .instrument(span)
        .await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Records `geolog_http_requests_total` and
/// `geolog_http_request_duration_seconds` for every request.
pub(crate) async fn record_http_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());

    let response = next.run(request).await;
    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "geolog_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "geolog_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());

    response
}
