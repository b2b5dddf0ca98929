//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate (corpus, index, embeddings).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Completion call failed after retries.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Retrieval produced no chunks and the policy forbids answering without context.
    #[error("no relevant context found for the question")]
    EmptyContext,

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),
}

impl ContextorError {
    /// Stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            ContextorError::Rag(rag_store::RagError::Embedding(e)) | ContextorError::Llm(e) => {
                e.code()
            }
            ContextorError::Rag(rag_store::RagError::EmptyIndex) => "EMPTY_INDEX",
            ContextorError::Rag(rag_store::RagError::Io { .. }) => "IO_ERROR",
            ContextorError::Rag(_) => "RAG_ERROR",
            ContextorError::EmptyContext => "EMPTY_CONTEXT",
            ContextorError::Config(_) => "CONFIG_ERROR",
        }
    }
}
