//! OpenAI-compatible LLM access shared by the corpus QA service.
//!
//! Provides chat completion and batched embeddings with request-scoped
//! credentials ([`ApiKey`]), an error taxonomy that distinguishes
//! authentication, throttling and transient upstream failures, retry with
//! exponential backoff, and the tracing layer used by the binary.

pub mod config;
pub mod error_handler;
pub mod retry;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::api_key::ApiKey;
pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError};
pub use retry::RetryPolicy;
pub use service_profiles::LlmServiceProfiles;
pub use services::open_ai_service::OpenAiService;
