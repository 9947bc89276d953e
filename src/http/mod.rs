//! HTTP transport.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /export/csv?project=<id>&layer=<id>` | Streamed `text/csv` |
//! | `GET /health` | `ok` |
//!
//! Errors raised before streaming starts map to plain-text responses: 400 for
//! a missing `project`, 404 for an unknown project, 422 for an ambiguous form,
//! 500 for store failures.

pub mod body;
pub mod handlers;

pub use handlers::{ExportParams, status_for};

use crate::export::ExportService;
use crate::storage::DocumentStore;
use crate::{Error, Result};
use axum::Router;
use axum::http::{HeaderValue, header};
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Export service over the shared store.
    pub service: ExportService<dyn DocumentStore>,
    /// Encoded chunks buffered per response before the exporter blocks.
    pub stream_buffer: usize,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub fn new(service: ExportService<dyn DocumentStore>, stream_buffer: usize) -> Self {
        Self {
            service,
            stream_buffer: stream_buffer.max(1),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/export/csv", get(handlers::export_csv))
        .route("/health", get(handlers::health))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `listener` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| Error::operation("local_addr", e))?;
    tracing::info!(%addr, "Serving CSV exports");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::operation("serve", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
