//! Retrieval: embed the question, query the index, map ids back to chunks.

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::score;
use crate::record::{RagHit, RagQuery};
use crate::IndexSnapshot;

use tracing::{error, trace};

/// Embeds the query text and returns RAG context hits, nearest first.
///
/// # Errors
/// - `RagError::EmptyIndex` when the snapshot holds no chunks (no remote call is made).
/// - Embedding/provider errors or `RagError::VectorSizeMismatch`.
pub async fn rag_context(
    snapshot: &IndexSnapshot,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<RagHit>, RagError> {
    trace!("retrieve::rag_context top_k={}", query.top_k);
    let index = snapshot.index.as_ref().ok_or(RagError::EmptyIndex)?;

    let qv = provider.embed(query.text).await?;
    let nearest = index.query(&qv, query.top_k)?;

    let mut out = Vec::with_capacity(nearest.len());
    for (id, distance) in nearest {
        let Some(chunk) = snapshot.chunks.get(id.0) else {
            error!("retrieve::rag_context unknown chunk id={}", id.0);
            return Err(RagError::UnknownChunk {
                id: id.0,
                len: snapshot.chunks.len(),
            });
        };
        out.push(RagHit {
            score: score(index.distance_kind(), distance),
            distance,
            text: chunk.text.clone(),
            source: chunk.doc_id.clone(),
            order: chunk.order,
        });
    }

    trace!("retrieve::rag_context hits={}", out.len());
    Ok(out)
}
