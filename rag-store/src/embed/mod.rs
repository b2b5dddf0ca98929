use crate::errors::RagError;
use ai_llm_service::AiLlmError;
use std::{future::Future, pin::Pin};

/// Boxed future returned by [`EmbeddingsProvider`] methods.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in another embedding backend. Async because
/// real providers perform HTTP requests.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds a batch of texts; the output is index-aligned with `texts`.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>>;

    /// Embeds a single text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let input = [text.to_string()];
            self.embed_batch(&input).await?.pop().ok_or_else(|| {
                RagError::Embedding(AiLlmError::Decode("empty embeddings response".into()))
            })
        })
    }

    /// Model identity used to key cached indexes.
    fn model_id(&self) -> &str;
}

pub mod openai;
