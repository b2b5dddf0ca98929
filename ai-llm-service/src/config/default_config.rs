//! Default LLM configs loaded from environment variables.
//!
//! Two profiles are used by the service:
//!
//! - **Chat**      → answer generation (`/v1/chat/completions`)
//! - **Embedding** → vector generation (`/v1/embeddings`)
//!
//! Both talk to the same OpenAI-compatible endpoint. Every variable has a
//! default, so an empty environment yields a working configuration that
//! points at the public OpenAI API.
//!
//! # Environment variables
//!
//! - `OPENAI_BASE_URL`        = API base URL (default `https://api.openai.com`)
//! - `OPENAI_CHAT_MODEL`      = chat model (default `gpt-3.5-turbo`)
//! - `OPENAI_EMBEDDING_MODEL` = embedding model (default `text-embedding-ada-002`)
//! - `LLM_TEMPERATURE`        = optional sampling temperature (f32, 0..=2)
//! - `LLM_MAX_TOKENS`         = optional completion limit (u32)
//! - `LLM_TIMEOUT_SECS`       = HTTP timeout (default 60)
//! - `LLM_MAX_ATTEMPTS`       = retry attempts including the first (default 4)
//! - `LLM_RETRY_BASE_MS`      = first backoff delay (default 500)
//! - `LLM_RETRY_MAX_MS`       = backoff cap (default 8000)

use std::time::Duration;

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{Result, env_opt_parse, env_opt_u32, env_or},
    retry::RetryPolicy,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn endpoint() -> String {
    env_or("OPENAI_BASE_URL", DEFAULT_ENDPOINT)
}

fn timeout_secs() -> Result<u64> {
    Ok(env_opt_parse::<u64>("LLM_TIMEOUT_SECS", "expected seconds (u64)")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS))
}

/// Constructs the **chat** profile used for answer generation.
///
/// # Errors
/// Malformed numbers or out-of-range sampling values yield `AiLlmError::Config`.
pub fn config_openai_chat() -> Result<LlmModelConfig> {
    let cfg = LlmModelConfig {
        model: env_or("OPENAI_CHAT_MODEL", DEFAULT_CHAT_MODEL),
        endpoint: endpoint(),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: env_opt_parse::<f32>("LLM_TEMPERATURE", "expected a float")?,
        top_p: None,
        timeout_secs: Some(timeout_secs()?),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the **embedding** profile used for chunks and questions.
///
/// # Errors
/// Malformed numbers yield `AiLlmError::Config`.
pub fn config_openai_embedding() -> Result<LlmModelConfig> {
    let cfg = LlmModelConfig {
        model: env_or("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
        endpoint: endpoint(),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(timeout_secs()?),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the retry policy shared by both profiles.
///
/// # Errors
/// Malformed numbers yield `AiLlmError::Config`.
pub fn retry_policy_from_env() -> Result<RetryPolicy> {
    let dflt = RetryPolicy::default();
    let max_attempts =
        env_opt_u32("LLM_MAX_ATTEMPTS")?.unwrap_or(dflt.max_attempts).max(1);
    let base_delay = env_opt_parse::<u64>("LLM_RETRY_BASE_MS", "expected milliseconds (u64)")?
        .map(Duration::from_millis)
        .unwrap_or(dflt.base_delay);
    let max_delay = env_opt_parse::<u64>("LLM_RETRY_MAX_MS", "expected milliseconds (u64)")?
        .map(Duration::from_millis)
        .unwrap_or(dflt.max_delay);

    Ok(RetryPolicy {
        max_attempts,
        base_delay,
        max_delay: max_delay.max(base_delay),
    })
}
