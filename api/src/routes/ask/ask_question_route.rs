//! POST /ask — answers a question from the local corpus.

use std::sync::Arc;

use ai_llm_service::ApiKey;
use axum::{Json, extract::State};
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::ask::ask_request::{AskPayload, AskResponse},
};

/// Handler: POST /ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3000/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"What color is the sky?","apiKey":"sk-..."}'
/// ```
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    AskPayload(body): AskPayload,
) -> AppResult<Json<AskResponse>> {
    let question = body.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("`question` must not be empty".into()));
    }
    let key = ApiKey::new(body.api_key)
        .ok_or_else(|| AppError::BadRequest("`apiKey` must not be empty".into()))?;

    info!(question_chars = question.chars().count(), "POST /ask");
    let qa = state.contextor.answer(question, &key).await?;

    Ok(Json(AskResponse { answer: qa.answer }))
}
