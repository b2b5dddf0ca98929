//! HTTP surface: `POST /ask`, `GET /health` and static assets.

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::{path::Path, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    core::app_state::{AppConfig, AppState},
    error_handler::AppError,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{ask::ask_question_route::ask_question, health_route::health},
};

/// Builds the application router. Unrouted paths are served from `static_dir`.
pub fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/ask", post(ask_question))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reads configuration from the environment, binds and serves until Ctrl+C.
///
/// # Errors
/// Configuration, bind and server errors.
pub async fn start() -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    let state = Arc::new(AppState::from_env()?);
    let app = build_router(state, &cfg.static_dir);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    info!("listening on http://{addr} static_dir={:?}", cfg.static_dir);

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
