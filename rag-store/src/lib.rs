//! In-process RAG store: corpus loading, chunking, embedding and exact
//! nearest-neighbour retrieval over a small directory of text files.
//!
//! The built index lives in an immutable [`IndexSnapshot`] shared through
//! `Arc`. [`RagStore`] caches the latest snapshot keyed by the corpus
//! fingerprint and the chunking/embedding settings, and rebuilds it when any
//! of them change. Readers never hold a lock across I/O or remote calls.

mod config;
mod discovery;
mod embed;
mod embed_pool;
mod errors;
mod index;
mod record;
mod retrieve;

pub mod chunker;

pub use chunker::{chunk_document, ChunkParams, Chunks};
pub use config::{DistanceKind, RagConfig};
pub use discovery::{corpus_fingerprint, load_corpus, Fingerprint};
pub use embed::openai::OpenAiEmbedder;
pub use embed::{EmbedFuture, EmbeddingsProvider};
pub use embed_pool::embed_chunks;
pub use errors::RagError;
pub use index::VectorIndex;
pub use record::{Chunk, ChunkId, Document, RagHit, RagQuery};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, error, info, trace};

/// Lifecycle of the shared index, reported by the health endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexStatus {
    /// Nothing built yet.
    Idle,
    /// A build is in progress.
    Loading,
    /// The last build succeeded.
    Ready { documents: usize, chunks: usize },
    /// The last build failed.
    Failed { message: String },
}

/// Identity of a built index: corpus state plus every setting that shapes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
    pub corpus: Fingerprint,
    pub params: ChunkParams,
    pub distance: DistanceKind,
    pub model: String,
}

/// A fully built, read-only index with its chunk metadata.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub key: CacheKey,
    pub documents: usize,
    /// Chunks in index order; `ChunkId(i)` refers to `chunks[i]`.
    pub chunks: Vec<Chunk>,
    /// `None` when the corpus produced no chunks.
    pub index: Option<VectorIndex>,
    generation: u64,
}

/// In-flight build shared by concurrent cache misses for one key.
type SharedBuild = Arc<OnceCell<Arc<IndexSnapshot>>>;

/// High-level facade over corpus, index cache and retrieval.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    params: ChunkParams,
    cache: RwLock<Option<Arc<IndexSnapshot>>>,
    /// Status plus the generation of the build that published it.
    status: RwLock<(u64, IndexStatus)>,
    building: Mutex<Option<(CacheKey, SharedBuild)>>,
    generation: AtomicU64,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` if the configuration does not validate.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;
        let params = cfg.chunk_params()?;
        trace!("RagStore::new corpus_dir={:?}", cfg.corpus_dir);
        Ok(Self {
            cfg,
            params,
            cache: RwLock::new(None),
            status: RwLock::new((0, IndexStatus::Idle)),
            building: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Current index lifecycle state.
    pub async fn status(&self) -> IndexStatus {
        self.status.read().await.1.clone()
    }

    /// Returns a snapshot matching the current corpus, building one if needed.
    ///
    /// With `cache_index` enabled, concurrent misses for the same key share a
    /// single build. With it disabled every call builds a fresh snapshot.
    ///
    /// # Errors
    /// I/O, embedding and dimension errors from the build.
    pub async fn snapshot(
        &self,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Arc<IndexSnapshot>, RagError> {
        let key = match self.cache_key(provider).await {
            Ok(key) => key,
            Err(e) => {
                let generation = self.next_generation();
                return Err(self.fail(generation, e).await);
            }
        };

        if !self.cfg.cache_index {
            return self.build_and_publish(key, provider).await;
        }

        let cached = self.cache.read().await.clone();
        if let Some(snap) = cached.filter(|s| s.key == key) {
            trace!("RagStore::snapshot cache hit {}", key.corpus.to_hex());
            self.mark_ready(&snap).await;
            return Ok(snap);
        }

        let cell = {
            let mut slot = self.building.lock().await;
            match slot.as_ref() {
                Some((k, cell)) if *k == key => cell.clone(),
                _ => {
                    let cell: SharedBuild = Arc::new(OnceCell::new());
                    *slot = Some((key.clone(), cell.clone()));
                    cell
                }
            }
        };

        let snap = cell
            .get_or_try_init(|| self.build_and_publish(key, provider))
            .await?
            .clone();

        let mut slot = self.building.lock().await;
        if slot.as_ref().is_some_and(|(_, c)| Arc::ptr_eq(c, &cell)) {
            *slot = None;
        }
        Ok(snap)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn build_and_publish(
        &self,
        key: CacheKey,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Arc<IndexSnapshot>, RagError> {
        let generation = self.next_generation();
        self.publish(generation, IndexStatus::Loading).await;

        match self.build(key, generation, provider).await {
            Ok(snap) => {
                let snap = Arc::new(snap);
                self.publish(
                    generation,
                    IndexStatus::Ready {
                        documents: snap.documents,
                        chunks: snap.chunks.len(),
                    },
                )
                .await;
                if self.cfg.cache_index {
                    let mut slot = self.cache.write().await;
                    if slot.as_ref().is_none_or(|cur| cur.generation < generation) {
                        *slot = Some(snap.clone());
                    }
                }
                Ok(snap)
            }
            Err(e) => Err(self.fail(generation, e).await),
        }
    }

    /// Writes `status` unless a newer build has already published.
    async fn publish(&self, generation: u64, status: IndexStatus) {
        let mut slot = self.status.write().await;
        if generation >= slot.0 {
            *slot = (generation, status);
        } else {
            debug!(
                "RagStore::publish dropped stale status from generation {generation} (current {})",
                slot.0
            );
        }
    }

    /// A cache hit proves the index is usable; repair a stale non-loading status.
    async fn mark_ready(&self, snap: &IndexSnapshot) {
        let ready = IndexStatus::Ready {
            documents: snap.documents,
            chunks: snap.chunks.len(),
        };
        let mut slot = self.status.write().await;
        if !matches!(slot.1, IndexStatus::Loading) && slot.1 != ready {
            slot.1 = ready;
        }
    }

    async fn fail(&self, generation: u64, e: RagError) -> RagError {
        error!("RagStore::snapshot build failed: {e}");
        self.publish(
            generation,
            IndexStatus::Failed {
                message: e.to_string(),
            },
        )
        .await;
        e
    }

    /// Retrieves the hits for `query` against the current snapshot.
    ///
    /// # Errors
    /// Build errors, `RagError::EmptyIndex`, or embedding errors for the query.
    pub async fn rag_context(
        &self,
        query: RagQuery<'_>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<RagHit>, RagError> {
        let snap = self.snapshot(provider).await?;
        retrieve::rag_context(&snap, query, provider).await
    }

    async fn cache_key(&self, provider: &dyn EmbeddingsProvider) -> Result<CacheKey, RagError> {
        let dir = self.cfg.corpus_dir.clone();
        let exts = self.cfg.extensions.clone();
        let corpus =
            tokio::task::spawn_blocking(move || corpus_fingerprint(&dir, &exts)).await??;
        Ok(CacheKey {
            corpus,
            params: self.params,
            distance: self.cfg.distance,
            model: provider.model_id().to_string(),
        })
    }

    async fn build(
        &self,
        key: CacheKey,
        generation: u64,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<IndexSnapshot, RagError> {
        info!("RagStore::build corpus_dir={:?}", self.cfg.corpus_dir);

        let dir = self.cfg.corpus_dir.clone();
        let exts = self.cfg.extensions.clone();
        let params = self.params;
        let (documents, chunks) = tokio::task::spawn_blocking(move || {
            let docs = load_corpus(&dir, &exts)?;
            let chunks: Vec<Chunk> = docs.iter().flat_map(|d| chunk_document(d, params)).collect();
            Ok::<_, RagError>((docs.len(), chunks))
        })
        .await??;
        debug!("RagStore::build documents={} chunks={}", documents, chunks.len());

        let vectors = embed_chunks(
            &chunks,
            provider,
            self.cfg.embedding_batch_size,
            self.cfg.embedding_concurrency,
        )
        .await?;

        let index = if vectors.is_empty() {
            None
        } else {
            let entries = vectors.into_iter().enumerate().map(|(i, v)| (ChunkId(i), v)).collect();
            Some(VectorIndex::build(self.cfg.distance, entries)?)
        };

        info!(
            "RagStore::build ready documents={} chunks={} dim={}",
            documents,
            chunks.len(),
            index.as_ref().map(VectorIndex::dim).unwrap_or_default()
        );
        Ok(IndexSnapshot {
            key,
            documents,
            chunks,
            index,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use ai_llm_service::AiLlmError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Keyword embedder: one dimension per topic, counts batch calls.
    #[derive(Default)]
    struct TopicEmbedder {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl EmbeddingsProvider for TopicEmbedder {
        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                Ok(texts
                    .iter()
                    .map(|t| {
                        let t = t.to_lowercase();
                        vec![
                            t.contains("sky") as u8 as f32,
                            t.contains("grass") as u8 as f32,
                            0.1,
                        ]
                    })
                    .collect())
            })
        }

        fn model_id(&self) -> &str {
            "topics"
        }
    }

    /// Rejects every batch after `delay`, like a provider refusing a key.
    struct RejectingEmbedder {
        delay: Duration,
    }

    impl EmbeddingsProvider for RejectingEmbedder {
        fn embed_batch<'a>(&'a self, _texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Err(RagError::Embedding(AiLlmError::Decode("bad key".into())))
            })
        }

        fn model_id(&self) -> &str {
            "rejecting"
        }
    }

    fn store(dir: &std::path::Path, cache: bool) -> RagStore {
        let mut cfg = RagConfig::new_default(dir);
        cfg.chunk_size = 20;
        cfg.chunk_overlap = 0;
        cfg.cache_index = cache;
        RagStore::new(cfg).unwrap()
    }

    #[tokio::test]
    async fn retrieves_nearest_chunk_with_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sky.txt"), "The sky is blue.").unwrap();
        fs::write(dir.path().join("grass.txt"), "Grass is green.").unwrap();
        let store = store(dir.path(), true);
        let emb = TopicEmbedder::default();

        let hits = store
            .rag_context(RagQuery { text: "What color is the sky?", top_k: 1 }, &emb)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "sky.txt");
        assert_eq!(hits[0].text, "The sky is blue.");
        assert!(hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn cache_is_reused_until_corpus_changes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "The sky is blue.").unwrap();
        let store = store(dir.path(), true);
        let emb = TopicEmbedder::default();
        assert_eq!(store.status().await, IndexStatus::Idle);

        let first = store.snapshot(&emb).await.unwrap();
        let again = store.snapshot(&emb).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(emb.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.status().await,
            IndexStatus::Ready { documents: 1, chunks: 1 }
        );

        fs::write(dir.path().join("a.txt"), "The sky is blue. Grass is green.").unwrap();
        let rebuilt = store.snapshot(&emb).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.chunks.len(), 2);
    }

    #[tokio::test]
    async fn disabled_cache_rebuilds_every_time() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "The sky is blue.").unwrap();
        let store = store(dir.path(), false);
        let emb = TopicEmbedder::default();

        store.snapshot(&emb).await.unwrap();
        store.snapshot(&emb).await.unwrap();
        assert_eq!(emb.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_corpus_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), true);
        let emb = TopicEmbedder::default();

        let err = store
            .rag_context(RagQuery { text: "anything", top_k: 4 }, &emb)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
        assert_eq!(emb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_corpus_marks_status_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("missing"), true);
        let emb = TopicEmbedder::default();

        assert!(matches!(
            store.snapshot(&emb).await,
            Err(RagError::Io { .. })
        ));
        assert!(matches!(store.status().await, IndexStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn late_failure_of_older_build_keeps_ready_status() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "The sky is blue.").unwrap();
        let store = store(dir.path(), true);
        let rejecting = RejectingEmbedder {
            delay: Duration::from_millis(200),
        };
        let fast = TopicEmbedder::default();

        let older = store.snapshot(&rejecting);
        let newer = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.snapshot(&fast).await
        };
        let (older, newer) = tokio::join!(older, newer);
        assert!(older.is_err());
        assert!(newer.is_ok());
        assert_eq!(
            store.status().await,
            IndexStatus::Ready { documents: 1, chunks: 1 }
        );

        let hits = store
            .rag_context(RagQuery { text: "sky", top_k: 1 }, &fast)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            store.status().await,
            IndexStatus::Ready { documents: 1, chunks: 1 }
        );
    }

    #[tokio::test]
    async fn cache_hit_repairs_status_after_failed_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "The sky is blue.").unwrap();
        let store = store(dir.path(), true);
        let good = TopicEmbedder::default();
        let rejecting = RejectingEmbedder {
            delay: Duration::ZERO,
        };

        store.snapshot(&good).await.unwrap();
        assert!(store.snapshot(&rejecting).await.is_err());
        assert!(matches!(store.status().await, IndexStatus::Failed { .. }));

        store.snapshot(&good).await.unwrap();
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.status().await,
            IndexStatus::Ready { documents: 1, chunks: 1 }
        );
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "The sky is blue.").unwrap();
        let store = store(dir.path(), true);
        let emb = TopicEmbedder {
            delay: Duration::from_millis(50),
            ..TopicEmbedder::default()
        };

        let (a, b) = tokio::join!(store.snapshot(&emb), store.snapshot(&emb));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(emb.calls.load(Ordering::SeqCst), 1);
    }
}
