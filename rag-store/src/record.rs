//! Core data models used by the library.

use std::ops::Range;

use serde::Serialize;

/// A corpus file loaded into memory. Immutable after load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// File name relative to the corpus directory.
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A contiguous slice of a [`Document`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub doc_id: String,
    /// Position of the chunk within its document.
    pub order: usize,
    /// Character (Unicode scalar) offsets in the document.
    pub span: Range<usize>,
    pub text: String,
}

/// Position of a chunk inside an [`crate::IndexSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub usize);

/// Query parameters for RAG retrieval.
#[derive(Clone, Copy, Debug)]
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: usize,
}

/// A single retrieval hit.
#[derive(Clone, Debug, Serialize)]
pub struct RagHit {
    /// Similarity, higher is closer (`1 - distance` for cosine).
    pub score: f32,
    /// Raw distance under the configured metric, lower is closer.
    pub distance: f32,
    pub text: String,
    /// Document id the chunk came from.
    pub source: String,
    pub order: usize,
}
