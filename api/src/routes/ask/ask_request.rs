use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Request payload for /ask.
///
/// Missing fields deserialize as empty and are rejected by the handler.
#[derive(Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    #[serde(default)]
    pub question: String,
    /// Caller's OpenAI API key, used for this request only.
    #[serde(default, rename = "apiKey", alias = "openAIApiKey")]
    pub api_key: String,
}

impl std::fmt::Debug for AskRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskRequest")
            .field("question", &self.question)
            .field("api_key", &"***")
            .finish()
    }
}

/// Response payload for /ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Final model answer (plain text).
    pub answer: String,
}

/// Extracts [`AskRequest`] from a JSON or url-encoded form body.
///
/// Rejections are axum's own responses; `json_error_mapper` turns them into
/// `{ "error": ... }`.
pub struct AskPayload(pub AskRequest);

impl<S> FromRequest<S> for AskPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<AskRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<AskRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body))
        }
    }
}
