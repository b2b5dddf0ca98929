//! Runtime configuration for corpus loading, chunking and retrieval.

use std::path::PathBuf;
use std::str::FromStr;

use crate::chunker::ChunkParams;
use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistanceKind {
    /// Cosine distance, `1 - cos(a, b)` (recommended for most embeddings).
    Cosine,
    /// Negated dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl DistanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceKind::Cosine => "cosine",
            DistanceKind::Dot => "dot",
            DistanceKind::Euclid => "euclid",
        }
    }
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            "euclid" | "euclidean" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(RagError::Config(format!("unknown distance `{other}`"))),
        }
    }
}

/// Configuration for corpus ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Directory holding the corpus files.
    pub corpus_dir: PathBuf,
    /// Accepted file extensions, lowercase with a leading dot (e.g. `.txt`).
    pub extensions: Vec<String>,
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of chunks retrieved per question.
    pub top_k: usize,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Texts per embeddings request.
    pub embedding_batch_size: usize,
    /// Embeddings requests in flight while building an index.
    pub embedding_concurrency: usize,
    /// Reuse the built index while the corpus fingerprint is unchanged.
    pub cache_index: bool,
}

impl RagConfig {
    /// Creates a default config for the given corpus directory.
    pub fn new_default(corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            extensions: vec![".txt".to_string()],
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            distance: DistanceKind::Cosine,
            embedding_batch_size: 512,
            embedding_concurrency: 2,
            cache_index: true,
        }
    }

    /// Builds from environment variables with defaults from [`RagConfig::new_default`].
    ///
    /// Variables: `CORPUS_DIR`, `CORPUS_EXTENSIONS`, `RAG_CHUNK_SIZE`,
    /// `RAG_CHUNK_OVERLAP`, `RAG_TOP_K`, `RAG_DISTANCE`, `EMBEDDING_BATCH_SIZE`,
    /// `EMBEDDING_CONCURRENCY`, `RAG_CACHE_INDEX`.
    ///
    /// # Errors
    /// Returns `RagError::Config` for malformed values or an invalid result.
    pub fn from_env() -> Result<Self, RagError> {
        let dflt = Self::new_default(env("CORPUS_DIR", "meusarquivos"));

        let extensions = match std::env::var("CORPUS_EXTENSIONS") {
            Ok(v) if !v.trim().is_empty() => parse_extensions(&v),
            _ => dflt.extensions.clone(),
        };

        let cfg = Self {
            extensions,
            chunk_size: parse("RAG_CHUNK_SIZE", dflt.chunk_size)?,
            chunk_overlap: parse("RAG_CHUNK_OVERLAP", dflt.chunk_overlap)?,
            top_k: parse("RAG_TOP_K", dflt.top_k)?,
            distance: env("RAG_DISTANCE", dflt.distance.as_str()).parse()?,
            embedding_batch_size: parse("EMBEDDING_BATCH_SIZE", dflt.embedding_batch_size)?,
            embedding_concurrency: parse("EMBEDDING_CONCURRENCY", dflt.embedding_concurrency)?,
            cache_index: parse("RAG_CACHE_INDEX", dflt.cache_index)?,
            ..dflt
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Chunking parameters derived from this config.
    ///
    /// # Errors
    /// Returns `RagError::Config` when `chunk_overlap >= chunk_size` or `chunk_size == 0`.
    pub fn chunk_params(&self) -> Result<ChunkParams, RagError> {
        ChunkParams::new(self.chunk_size, self.chunk_overlap)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        self.chunk_params()?;
        if self.extensions.is_empty() {
            return Err(RagError::Config("at least one corpus extension is required".into()));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be > 0".into()));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::Config("embedding_batch_size must be > 0".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("embedding_concurrency must be > 0".into()));
        }
        Ok(())
    }
}

/// Normalizes `txt, .MD` into `[".txt", ".md"]`.
pub(crate) fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| if s.starts_with('.') { s } else { format!(".{s}") })
        .collect()
}

fn env(k: &str, dflt: &str) -> String {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => dflt.to_string(),
    }
}

fn parse<T: FromStr>(k: &str, dflt: T) -> Result<T, RagError> {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{k} has an invalid value `{v}`"))),
        _ => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_normalized() {
        assert_eq!(parse_extensions("txt, .MD ,,"), vec![".txt", ".md"]);
    }

    #[test]
    fn distance_parses_aliases() {
        assert_eq!("Cosine".parse::<DistanceKind>().unwrap(), DistanceKind::Cosine);
        assert_eq!("l2".parse::<DistanceKind>().unwrap(), DistanceKind::Euclid);
        assert!("manhattan".parse::<DistanceKind>().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut cfg = RagConfig::new_default("corpus");
        cfg.chunk_overlap = cfg.chunk_size;
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
    }
}
