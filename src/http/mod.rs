//! HTTP adapter for the `/api/v1/logs` resource.
//!
//! | Route | Method | Handler |
//! |-------|--------|---------|
//! | `/api/v1/logs` | GET | list all records |
//! | `/api/v1/logs` | POST | create a record |
//! | `/api/v1/logs/{id}` | GET | fetch one record |
//!
//! Status codes for failures depend on the configured [`ErrorPolicy`].

pub mod error;
mod handlers;
mod middleware;

pub use error::{
    ApiError, ErrorPolicy, FIELDS_EMPTY_MESSAGE, INTERNAL_MESSAGE, LIST_EMPTY_MESSAGE,
    NOT_FOUND_MESSAGE,
};
pub use middleware::REQUEST_ID_HEADER;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::http::header;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::GeologConfig;
use crate::services::RecordService;
use crate::{Error, Result};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub(crate) service: Arc<RecordService>,
    pub(crate) policy: ErrorPolicy,
}

impl AppState {
    /// Creates handler state from a service and an error policy.
    #[must_use]
    pub const fn new(service: Arc<RecordService>, policy: ErrorPolicy) -> Self {
        Self { service, policy }
    }
}

/// Builds the application router.
pub fn router(service: Arc<RecordService>, policy: ErrorPolicy) -> Router {
    let api = Router::new()
        .route("/logs", get(handlers::list_logs).post(handlers::create_log))
        .route("/logs/{id}", get(handlers::get_log));

    Router::new()
        .nest("/api/v1", api)
        .with_state(AppState::new(service, policy))
        .layer(axum::middleware::from_fn(middleware::record_http_metrics))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::propagate_request_id))
}

/// Serves `app` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::operation("serve", e))
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address is invalid, cannot be bound, or the
/// server fails.
pub async fn run(config: &GeologConfig, service: Arc<RecordService>) -> Result<()> {
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::operation("bind", format!("{addr}: {e}")))?;

    tracing::info!(
        %addr,
        error_policy = config.error_policy.as_str(),
        strict_coordinates = config.validation.strict_coordinates,
        "Starting geolog HTTP server"
    );

    serve(listener, router(service, config.error_policy), shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
