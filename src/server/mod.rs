//! HTTP front end: multipart uploads in, subtitle files or JSON out.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

pub use error::{ErrorBody, HttpError};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::language::LanguageTable;
use crate::workflow::Workflow;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub languages: LanguageTable,
}

impl AppState {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
            languages: LanguageTable::standard(),
        }
    }
}

/// Build the router with all routes and middleware.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let limit = config.upload_limit_bytes();

    Router::new()
        .route("/extract-audio/", post(handlers::extract_audio))
        .route("/generate-subs/", post(handlers::generate_subs))
        .route("/translate-srt/", post(handlers::translate_srt))
        .route("/process-video/", post(handlers::process_video))
        .route("/languages", get(handlers::languages))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
