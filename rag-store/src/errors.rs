//! Unified error types for the crate.

use std::path::PathBuf;

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Corpus directory or file could not be read.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid chunking, retrieval or cache configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across records or against a query.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// The index returned an id with no chunk behind it (snapshot is corrupt).
    #[error("index returned unknown chunk id {id} (snapshot holds {len} chunks)")]
    UnknownChunk { id: usize, len: usize },

    /// The index holds no vectors (empty corpus or nothing built yet).
    #[error("vector index is empty: no chunks were indexed")]
    EmptyIndex,

    /// The embedding provider failed.
    #[error(transparent)]
    Embedding(#[from] AiLlmError),

    /// A blocking corpus task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RagError::Io {
            path: path.into(),
            source,
        }
    }
}
