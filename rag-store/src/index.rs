//! Exact in-memory nearest-neighbour index.
//!
//! Write-once: built from a complete set of vectors, then only queried.
//! Search is brute force over every entry, which is exact and plenty fast
//! for a corpus of a few thousand chunks.

use crate::config::DistanceKind;
use crate::errors::RagError;
use crate::record::ChunkId;

/// Brute-force vector index over `(ChunkId, vector)` pairs.
#[derive(Clone, Debug)]
pub struct VectorIndex {
    distance: DistanceKind,
    dim: usize,
    ids: Vec<ChunkId>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Builds the index from `entries`, keeping their insertion order.
    ///
    /// # Errors
    /// - `RagError::EmptyIndex` when `entries` is empty.
    /// - `RagError::VectorSizeMismatch` when vectors differ in dimension.
    pub fn build(distance: DistanceKind, entries: Vec<(ChunkId, Vec<f32>)>) -> Result<Self, RagError> {
        let dim = match entries.first() {
            Some((_, v)) => v.len(),
            None => return Err(RagError::EmptyIndex),
        };
        let mut ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (id, v) in entries {
            if v.len() != dim {
                return Err(RagError::VectorSizeMismatch {
                    got: v.len(),
                    want: dim,
                });
            }
            ids.push(id);
            vectors.push(v);
        }
        Ok(Self {
            distance,
            dim,
            ids,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn distance_kind(&self) -> DistanceKind {
        self.distance
    }

    /// Returns the `k` nearest entries as `(id, distance)`, nearest first.
    ///
    /// `k` is clamped to `1..=len`. Equal distances keep insertion order.
    ///
    /// # Errors
    /// - `RagError::EmptyIndex` when the index holds no entries.
    /// - `RagError::VectorSizeMismatch` when `query` has the wrong dimension.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkId, f32)>, RagError> {
        if self.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if query.len() != self.dim {
            return Err(RagError::VectorSizeMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        let k = k.clamp(1, self.len());

        let mut scored: Vec<(ChunkId, f32)> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(id, v)| (*id, distance(self.distance, query, v)))
            .collect();
        // Stable: ties stay in insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Distance between `a` and `b` under `kind`; lower is closer.
pub fn distance(kind: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    match kind {
        DistanceKind::Cosine => 1.0 - cosine_similarity(a, b),
        DistanceKind::Dot => -dot(a, b),
        DistanceKind::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

/// Converts a distance back into a similarity score; higher is closer.
pub fn score(kind: DistanceKind, distance: f32) -> f32 {
    match kind {
        DistanceKind::Cosine => 1.0 - distance,
        DistanceKind::Dot | DistanceKind::Euclid => -distance,
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; 0 when either vector has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}
