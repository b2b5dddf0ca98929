//! Embedding executor with batching, bounded concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, errors::RagError, record::Chunk};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Embeds every chunk, `batch_size` texts per provider call.
///
/// Batches are issued with up to `concurrency` in flight; results come back
/// in chunk order.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if a provider returns vectors of
/// differing dimension or the wrong count, or [`RagError::Embedding`] if the
/// provider fails. The first failure aborts the remaining batches.
pub async fn embed_chunks(
    chunks: &[Chunk],
    provider: &dyn EmbeddingsProvider,
    batch_size: usize,
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    let batch_size = batch_size.max(1);
    info!(
        "embed_pool::embed_chunks: total={} batch_size={} concurrency={}",
        chunks.len(),
        batch_size,
        concurrency
    );

    if chunks.is_empty() {
        debug!("embed_pool::embed_chunks: nothing to embed");
        return Ok(Vec::new());
    }

    let batches: Vec<Vec<String>> = chunks
        .chunks(batch_size)
        .map(|b| b.iter().map(|c| c.text.clone()).collect())
        .collect();

    let results: Vec<Vec<Vec<f32>>> = stream::iter(batches)
        .map(|texts: Vec<String>| async move {
            let vectors = provider.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(RagError::VectorSizeMismatch {
                    got: vectors.len(),
                    want: texts.len(),
                });
            }
            Ok::<_, RagError>(vectors)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let vectors: Vec<Vec<f32>> = results.into_iter().flatten().collect();
    if let Some(want) = vectors.first().map(Vec::len) {
        if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
            return Err(RagError::VectorSizeMismatch {
                got: bad.len(),
                want,
            });
        }
    }

    debug!("embed_pool::embed_chunks: vectors={}", vectors.len());
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbedFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds each text as `[len, calls]` and counts batches.
    struct CountingProvider {
        calls: AtomicUsize,
        ragged: bool,
    }

    impl EmbeddingsProvider for CountingProvider {
        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(texts
                    .iter()
                    .map(|t| {
                        if self.ragged && n > 0 {
                            vec![t.len() as f32]
                        } else {
                            vec![t.len() as f32, 1.0]
                        }
                    })
                    .collect())
            })
        }

        fn model_id(&self) -> &str {
            "counting"
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                doc_id: "d.txt".into(),
                order: i,
                span: 0..i,
                text: "x".repeat(i),
            })
            .collect()
    }

    #[tokio::test]
    async fn batches_and_keeps_order() {
        let p = CountingProvider {
            calls: AtomicUsize::new(0),
            ragged: false,
        };
        let out = embed_chunks(&chunks(7), &p, 3, 2).await.unwrap();
        assert_eq!(p.calls.load(Ordering::SeqCst), 3);
        let lens: Vec<f32> = out.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let p = CountingProvider {
            calls: AtomicUsize::new(0),
            ragged: false,
        };
        assert!(embed_chunks(&[], &p, 8, 1).await.unwrap().is_empty());
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mixed_dimensions_are_rejected() {
        let p = CountingProvider {
            calls: AtomicUsize::new(0),
            ragged: true,
        };
        let err = embed_chunks(&chunks(4), &p, 2, 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 1, want: 2 }));
    }
}
