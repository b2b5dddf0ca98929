//! Corpus discovery: list, read and fingerprint the files of the corpus directory.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::errors::RagError;
use crate::record::Document;

/// Content-independent identity of the corpus (names, sizes, mtimes).
pub type Fingerprint = blake3::Hash;

/// Loads one [`Document`] per regular file directly inside `dir` whose
/// extension matches `extensions` (case-insensitive). Sorted by file name.
///
/// # Errors
/// `RagError::Io` when the directory is missing or unreadable, or a file is
/// not valid UTF-8.
pub fn load_corpus(dir: &Path, extensions: &[String]) -> Result<Vec<Document>, RagError> {
    trace!("discovery::load_corpus dir={:?}", dir);
    let mut docs = Vec::new();
    for entry in corpus_entries(dir, extensions)? {
        let path = entry.path();
        let text = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let id = entry.file_name().to_string_lossy().into_owned();
        debug!(doc = %id, chars = text.chars().count(), "discovery::load_corpus loaded");
        docs.push(Document::new(id, text));
    }
    debug!("discovery::load_corpus documents={}", docs.len());
    Ok(docs)
}

/// Hashes `(file name, byte length, mtime)` of every corpus file in name order.
///
/// # Errors
/// `RagError::Io` when the directory or a file's metadata cannot be read.
pub fn corpus_fingerprint(dir: &Path, extensions: &[String]) -> Result<Fingerprint, RagError> {
    let mut hasher = blake3::Hasher::new();
    for entry in corpus_entries(dir, extensions)? {
        let meta = entry.metadata().map_err(|e| walk_error(dir, e))?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let name = entry.file_name().to_string_lossy();
        hasher.update(&(name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update(&meta.len().to_le_bytes());
        hasher.update(&mtime.to_le_bytes());
    }
    let fp = hasher.finalize();
    trace!("discovery::corpus_fingerprint -> {}", fp.to_hex());
    Ok(fp)
}

fn corpus_entries(dir: &Path, extensions: &[String]) -> Result<Vec<DirEntry>, RagError> {
    let meta = std::fs::metadata(dir).map_err(|e| RagError::io(dir, e))?;
    if !meta.is_dir() {
        return Err(RagError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "corpus path is not a directory"),
        ));
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            out.push(entry);
        }
    }
    Ok(out)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = format!(".{}", ext.to_string_lossy().to_ascii_lowercase());
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

fn walk_error(dir: &Path, e: walkdir::Error) -> RagError {
    let path: PathBuf = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    RagError::io(path, source)
}
