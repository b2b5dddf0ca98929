//! Fixed-size, overlapping character windows over a document.
//!
//! Sizes are counted in Unicode scalar values, so a window never splits a
//! code point. The window advances by `chunk_size - overlap` and the last
//! chunk is truncated to whatever text remains.

use crate::errors::RagError;
use crate::record::{Chunk, Document};

/// Validated chunking parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkParams {
    /// # Errors
    /// `RagError::Config` when `chunk_size == 0` or `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits `doc` into chunks. Lazy and restartable via `Clone`.
pub fn chunk_document(doc: &Document, params: ChunkParams) -> Chunks<'_> {
    Chunks {
        doc,
        params,
        offsets: doc.text.char_indices().map(|(i, _)| i).collect(),
        start: 0,
        order: 0,
        done: doc.text.is_empty(),
    }
}

/// Iterator returned by [`chunk_document`].
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    doc: &'a Document,
    params: ChunkParams,
    /// Byte offset of every character.
    offsets: Vec<usize>,
    /// Character index of the next window.
    start: usize,
    order: usize,
    done: bool,
}

impl Chunks<'_> {
    fn byte_at(&self, char_idx: usize) -> usize {
        self.offsets
            .get(char_idx)
            .copied()
            .unwrap_or(self.doc.text.len())
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }
        let total = self.offsets.len();
        let end = (self.start + self.params.chunk_size).min(total);
        let text = self.doc.text[self.byte_at(self.start)..self.byte_at(end)].to_string();

        let chunk = Chunk {
            doc_id: self.doc.id.clone(),
            order: self.order,
            span: self.start..end,
            text,
        };

        if end >= total {
            self.done = true;
        } else {
            self.start += self.params.step();
            self.order += 1;
        }
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&c.text);
            } else {
                out.extend(c.text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn rejects_invalid_params() {
        assert!(ChunkParams::new(0, 0).is_err());
        assert!(ChunkParams::new(10, 10).is_err());
        assert!(ChunkParams::new(10, 9).is_ok());
    }

    #[test]
    fn empty_document_has_no_chunks() {
        let doc = Document::new("e.txt", "");
        let p = ChunkParams::new(5, 1).unwrap();
        assert_eq!(chunk_document(&doc, p).count(), 0);
    }

    #[test]
    fn windows_overlap_and_last_is_truncated() {
        let doc = Document::new("d.txt", "abcdefghij");
        let p = ChunkParams::new(4, 1).unwrap();
        let texts: Vec<String> = chunk_document(&doc, p).map(|c| c.text).collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij"]);

        let doc = Document::new("d.txt", "abcdefghijk");
        let chunks: Vec<Chunk> = chunk_document(&doc, p).collect();
        assert_eq!(chunks.last().unwrap().text, "jk");
        assert_eq!(chunks.last().unwrap().span, 9..11);
        assert_eq!(chunks.last().unwrap().order, 3);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let doc = Document::new("u.txt", "ééééé");
        let p = ChunkParams::new(2, 0).unwrap();
        let texts: Vec<String> = chunk_document(&doc, p).map(|c| c.text).collect();
        assert_eq!(texts, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn iterator_is_restartable() {
        let doc = Document::new("r.txt", "the quick brown fox");
        let p = ChunkParams::new(6, 2).unwrap();
        let it = chunk_document(&doc, p);
        let a: Vec<Chunk> = it.clone().collect();
        let b: Vec<Chunk> = it.collect();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn chunks_reconstruct_the_document(
            text in "\\PC{0,300}",
            size in 1usize..40,
            overlap_seed in 0usize..40,
        ) {
            let overlap = overlap_seed % size;
            let doc = Document::new("p.txt", text.clone());
            let p = ChunkParams::new(size, overlap).unwrap();
            let chunks: Vec<Chunk> = chunk_document(&doc, p).collect();

            for c in &chunks {
                prop_assert!(c.text.chars().count() <= size);
            }
            prop_assert_eq!(reconstruct(&chunks, overlap), text);
        }

        #[test]
        fn without_overlap_count_is_ceil(text in "[a-z ]{0,500}", size in 1usize..64) {
            let doc = Document::new("p.txt", text.clone());
            let p = ChunkParams::new(size, 0).unwrap();
            let n = chunk_document(&doc, p).count();
            prop_assert_eq!(n, text.chars().count().div_ceil(size));
        }
    }
}
