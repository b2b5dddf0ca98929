//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Holds one HTTP client per profile; credentials are supplied per call.
//!
//! # Example
//! ```no_run
//! use ai_llm_service::{ApiKey, LlmModelConfig, LlmServiceProfiles, RetryPolicy};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let chat = LlmModelConfig::new("gpt-3.5-turbo", "https://api.openai.com");
//! let embedding = LlmModelConfig::new("text-embedding-ada-002", "https://api.openai.com");
//! let svc = LlmServiceProfiles::new(chat, embedding, RetryPolicy::default())?;
//!
//! let key = ApiKey::new("sk-...").expect("non-empty key");
//! let txt = svc.generate(&key, "Hello world", None).await?;
//! let emb = svc.embed_batch(&key, &["Ferris".to_string()]).await?;
//! println!("{txt} / dim = {}", emb[0].len());
//! # Ok(())
//! # }
//! ```

use crate::{
    config::{api_key::ApiKey, default_config, llm_model_config::LlmModelConfig},
    error_handler::Result,
    retry::RetryPolicy,
    services::open_ai_service::OpenAiService,
};

/// Shared service that manages the **chat** and **embedding** profiles.
#[derive(Debug)]
pub struct LlmServiceProfiles {
    chat: OpenAiService,
    embedding: OpenAiService,
}

impl LlmServiceProfiles {
    /// Creates a new service with both profiles sharing one retry policy.
    ///
    /// # Errors
    /// Returns `AiLlmError::Config` if either profile does not validate.
    pub fn new(chat: LlmModelConfig, embedding: LlmModelConfig, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            chat: OpenAiService::new(chat, retry)?,
            embedding: OpenAiService::new(embedding, retry)?,
        })
    }

    /// Builds both profiles and the retry policy from environment variables.
    ///
    /// # Errors
    /// Returns `AiLlmError::Config` on malformed variables.
    pub fn from_env() -> Result<Self> {
        Self::new(
            default_config::config_openai_chat()?,
            default_config::config_openai_embedding()?,
            default_config::retry_policy_from_env()?,
        )
    }

    /// Generates text using the **chat** profile.
    ///
    /// # Errors
    /// Returns `AiLlmError` if generation fails after retries.
    pub async fn generate(&self, key: &ApiKey, prompt: &str, system: Option<&str>) -> Result<String> {
        self.chat.generate(key, prompt, system).await
    }

    /// Computes embeddings for `inputs` using the **embedding** profile.
    ///
    /// # Errors
    /// Returns `AiLlmError` if embedding fails after retries.
    pub async fn embed_batch(&self, key: &ApiKey, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embedding.embed_batch(key, inputs).await
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (self.chat.config(), self.embedding.config())
    }
}
