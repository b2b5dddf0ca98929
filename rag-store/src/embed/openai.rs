//! OpenAI-compatible embedding provider.
//!
//! Wraps [`LlmServiceProfiles`] with the caller's [`ApiKey`]; one embedder is
//! created per request so credentials never outlive it.

use std::sync::Arc;

use ai_llm_service::{ApiKey, LlmServiceProfiles};

use crate::embed::{EmbedFuture, EmbeddingsProvider};

/// Embedder bound to one request's credentials.
#[derive(Clone, Debug)]
pub struct OpenAiEmbedder {
    svc: Arc<LlmServiceProfiles>,
    key: ApiKey,
}

impl OpenAiEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, key: ApiKey) -> Self {
        Self { svc, key }
    }
}

impl EmbeddingsProvider for OpenAiEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(self.svc.embed_batch(&self.key, texts).await?) })
    }

    fn model_id(&self) -> &str {
        &self.svc.profiles().1.model
    }
}
