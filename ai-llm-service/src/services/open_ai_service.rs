//! OpenAI-compatible service for text generation and embeddings.
//!
//! Minimal, non-streaming client around the OpenAI REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions — chat completion (non-streaming)
//! - POST {endpoint}/v1/embeddings       — batched embeddings retrieval
//!
//! The API key is an argument of every call and is attached as a per-request
//! `Authorization` header; the shared `reqwest::Client` carries no credentials.
//! Transient failures are retried according to the configured [`RetryPolicy`].

use std::time::{Duration, Instant};

use reqwest::header;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{api_key::ApiKey, llm_model_config::LlmModelConfig},
    error_handler::{AiLlmError, Result},
    retry::{RetryPolicy, with_backoff},
};

/// Thin client for one OpenAI-compatible model profile.
///
/// High-level operations:
/// - [`OpenAiService::generate`]    — single, non-streaming chat completion
/// - [`OpenAiService::embed_batch`] — embeddings for many inputs in one call
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    retry: RetryPolicy,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Config`] if the config does not validate
    /// - [`AiLlmError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig, retry: RetryPolicy) -> Result<Self> {
        cfg.validate()?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{base}/v1/chat/completions");
        let url_embeddings = format!("{base}/v1/embeddings");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            max_attempts = retry.max_attempts,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            retry,
            url_chat,
            url_embeddings,
        })
    }

    /// Model profile this service was built with.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// Messages: optional system message, then the user `prompt`.
    ///
    /// # Errors
    /// Any variant of the [`AiLlmError`] taxonomy; an answer without content
    /// is reported as [`AiLlmError::Decode`].
    pub async fn generate(&self, key: &ApiKey, prompt: &str, system: Option<&str>) -> Result<String> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_chat
        );

        let out: ChatCompletionResponse = with_backoff(&self.retry, "chat_completion", || {
            self.post_json(&self.url_chat, key, &body)
        })
        .await?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| AiLlmError::Decode("response has no `choices[].message.content`".into()))?;

        info!(
            model = %self.cfg.model,
            answer_len = content.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion completed"
        );

        Ok(content)
    }

    /// Retrieves one embedding per input via a single `/v1/embeddings` call.
    ///
    /// Vectors are returned in input order (the response `index` field is
    /// honoured). An empty input slice returns an empty vector without any
    /// network call.
    ///
    /// # Errors
    /// Any variant of the [`AiLlmError`] taxonomy; a response with a wrong
    /// number of vectors is reported as [`AiLlmError::Decode`].
    pub async fn embed_batch(&self, key: &ApiKey, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!(
            model = %self.cfg.model,
            batch = inputs.len(),
            "POST {}", self.url_embeddings
        );

        let out: EmbeddingsResponse = with_backoff(&self.retry, "embeddings", || {
            self.post_json(&self.url_embeddings, key, &body)
        })
        .await?;

        let vectors = order_embeddings(out.data, inputs.len())?;

        info!(
            model = %self.cfg.model,
            batch = inputs.len(),
            dim = vectors.first().map(Vec::len).unwrap_or(0),
            latency_ms = started.elapsed().as_millis() as u64,
            "embeddings completed"
        );

        Ok(vectors)
    }

    /// One POST attempt: send, classify the status, decode the JSON body.
    async fn post_json<B, T>(&self, url: &str, key: &ApiKey, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let started = Instant::now();
        let resp = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, key.bearer())
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(resp.headers());
            let text = resp.text().await.unwrap_or_default();
            let err = AiLlmError::from_status(status, url, &text, retry_after);

            error!(
                %status,
                %url,
                code = err.code(),
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis() as u64,
                "provider returned non-success status"
            );
            return Err(err);
        }

        resp.json::<T>().await.map_err(|e| {
            error!(
                error = %e,
                %url,
                model = %self.cfg.model,
                "failed to decode provider response"
            );
            AiLlmError::Decode(format!("serde error: {e}"))
        })
    }
}

/// Reads `Retry-After` as whole seconds (the HTTP-date form is ignored).
fn parse_retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Places every item at its `index`, checking that each input got exactly one vector.
fn order_embeddings(data: Vec<EmbeddingItem>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(AiLlmError::Decode(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (pos, item) in data.into_iter().enumerate() {
        let idx = item.index.unwrap_or(pos);
        match slots.get_mut(idx) {
            Some(slot) if slot.is_none() => *slot = Some(item.embedding),
            _ => {
                return Err(AiLlmError::Decode(format!(
                    "embedding index {idx} is out of range or duplicated"
                )));
            }
        }
    }
    slots
        .into_iter()
        .map(|v| v.ok_or_else(|| AiLlmError::Decode("missing embedding in response".into())))
        .collect()
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Request body for `/v1/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}
