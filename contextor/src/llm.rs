//! Completion seam and its OpenAI-backed implementation.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::{AiLlmError, ApiKey, LlmServiceProfiles};

/// Boxed future returned by [`ChatModel::complete`].
pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Anything that turns a prompt into an answer.
pub trait ChatModel: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> ChatFuture<'a>;
}

/// Chat completion bound to one request's credentials.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ai_llm_service::{ApiKey, LlmServiceProfiles};
/// # use contextor::llm::{ChatModel, OpenAiChat};
/// # #[tokio::main] async fn main() {
/// let svc = Arc::new(LlmServiceProfiles::from_env().unwrap());
/// let chat = OpenAiChat::new(svc, ApiKey::new("sk-...").unwrap());
/// let out = chat.complete("2+2=").await.unwrap();
/// assert!(!out.is_empty());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct OpenAiChat {
    svc: Arc<LlmServiceProfiles>,
    key: ApiKey,
}

impl OpenAiChat {
    pub fn new(svc: Arc<LlmServiceProfiles>, key: ApiKey) -> Self {
        Self { svc, key }
    }
}

impl ChatModel for OpenAiChat {
    fn complete<'a>(&'a self, prompt: &'a str) -> ChatFuture<'a> {
        Box::pin(self.svc.generate(&self.key, prompt, None))
    }
}
