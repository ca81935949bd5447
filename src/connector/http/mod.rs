//! HTTP API over the file, ingestion, search and chat use cases.

mod error;
mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::connector::api::Container;

pub use error::ApiError;
pub use handlers::{ChatRequest, ChatResponse, SearchHit, SearchRequest};

/// Large enough that oversized uploads reach the size validation.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn router(container: Arc<Container>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/files", get(handlers::list_files))
        .route(
            "/files/{file_id}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/files/{file_id}/ingest", post(handlers::ingest_file))
        .route("/upload", post(handlers::upload_file))
        .route("/search", post(handlers::search))
        .route("/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(container)
}

/// Serves until Ctrl-C.
pub async fn serve(container: Arc<Container>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(container))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
