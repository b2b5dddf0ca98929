//! GET /health — liveness plus corpus index state.

use std::sync::Arc;

use axum::{Json, extract::State};
use rag_store::IndexStatus;
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub index: IndexStatus,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        index: state.contextor.index_status().await,
    })
}
