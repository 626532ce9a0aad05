//! Persisted caches: embedding stores and cross-encoder score caches.
//!
//! These exist so a benchmark run can replay model outputs without the
//! models: embeddings are stored as raw little-endian f32 rows plus a JSON
//! identifier-order file per corpus key, and cross-encoder scores as one
//! JSON object keyed by a query-hash/chunk-id pair. Any in-memory substitute
//! satisfies the same contract.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::provider::TextEmbedder;
use crate::{HcrError, vecmath};

/// First 16 hex chars of the SHA-256 of a text. Cache-key building block.
pub fn text_key(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// File-based embedding store, keyed by corpus identifier.
///
/// Layout per key: `<key>.emb` (u64 row count, u64 dimension, then f32 rows,
/// all little-endian) and `<key>_ids.json` (identifier order).
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    /// Open a store rooted at `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HcrError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn emb_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.emb"))
    }

    fn ids_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}_ids.json"))
    }

    /// Whether both files for `key` exist.
    pub fn has(&self, key: &str) -> bool {
        self.emb_path(key).exists() && self.ids_path(key).exists()
    }

    /// Persist identifier order and embedding rows for `key`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `ids` and `rows` disagree in length or the
    /// rows are ragged.
    pub fn save(&self, key: &str, ids: &[String], rows: &[Vec<f32>]) -> Result<(), HcrError> {
        if ids.len() != rows.len() {
            return Err(HcrError::DimensionMismatch {
                expected: ids.len(),
                actual: rows.len(),
            });
        }
        let dim = rows.first().map_or(0, Vec::len);
        let mut bytes = Vec::with_capacity(16 + rows.len() * dim * 4);
        bytes.extend_from_slice(&(rows.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(dim as u64).to_le_bytes());
        for row in rows {
            if row.len() != dim {
                return Err(HcrError::DimensionMismatch {
                    expected: dim,
                    actual: row.len(),
                });
            }
            for value in row {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        std::fs::write(self.emb_path(key), bytes)?;
        std::fs::write(self.ids_path(key), serde_json::to_string(ids)?)?;
        Ok(())
    }

    /// Load identifier order and embedding rows for `key`.
    ///
    /// Absence is not an error: returns `Ok(None)` when either file is
    /// missing. A truncated binary file is an I/O-level failure.
    pub fn load(&self, key: &str) -> Result<Option<(Vec<String>, Vec<Vec<f32>>)>, HcrError> {
        if !self.has(key) {
            return Ok(None);
        }
        let ids: Vec<String> = serde_json::from_str(&std::fs::read_to_string(self.ids_path(key))?)?;
        let bytes = std::fs::read(self.emb_path(key))?;
        if bytes.len() < 16 {
            return Err(HcrError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "embedding file shorter than header",
            )));
        }
        let rows = u64::from_le_bytes(bytes[0..8].try_into().expect("8-byte slice")) as usize;
        let dim = u64::from_le_bytes(bytes[8..16].try_into().expect("8-byte slice")) as usize;
        let expected = 16 + rows * dim * 4;
        if bytes.len() != expected {
            return Err(HcrError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("embedding file is {} bytes, expected {}", bytes.len(), expected),
            )));
        }
        if rows != ids.len() {
            return Err(HcrError::DimensionMismatch {
                expected: ids.len(),
                actual: rows,
            });
        }
        let mut matrix = Vec::with_capacity(rows);
        let mut offset = 16;
        for _ in 0..rows {
            let mut row = Vec::with_capacity(dim);
            for _ in 0..dim {
                row.push(f32::from_le_bytes(
                    bytes[offset..offset + 4].try_into().expect("4-byte slice"),
                ));
                offset += 4;
            }
            matrix.push(row);
        }
        Ok(Some((ids, matrix)))
    }
}

/// Concurrent cross-encoder score cache, keyed by
/// `<16-hex query hash>_<chunk id>`.
///
/// The only mutable resource during evaluation; per-key inserts are atomic
/// so HCR and the flat cross-encoder baseline can share one cache across
/// queries.
#[derive(Debug, Default)]
pub struct CeScoreCache {
    scores: DashMap<String, f32>,
}

impl CeScoreCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(query_text: &str, chunk_id: &str) -> String {
        format!("{}_{}", text_key(query_text), chunk_id)
    }

    /// Look up a cached score. A miss is absence, never an error.
    pub fn get(&self, query_text: &str, chunk_id: &str) -> Option<f32> {
        self.scores
            .get(&Self::key(query_text, chunk_id))
            .map(|entry| *entry)
    }

    /// Insert a score.
    pub fn insert(&self, query_text: &str, chunk_id: &str, score: f32) {
        self.scores.insert(Self::key(query_text, chunk_id), score);
    }

    /// Number of cached scores.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the cache holds no scores.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Load scores from a JSON object file. Missing file leaves the cache empty.
    pub fn load(path: &Path) -> Result<Self, HcrError> {
        let cache = Self::new();
        if path.exists() {
            let map: HashMap<String, f32> =
                serde_json::from_str(&std::fs::read_to_string(path)?)?;
            for (key, score) in map {
                cache.scores.insert(key, score);
            }
        }
        Ok(cache)
    }

    /// Persist the cache to a JSON object file.
    pub fn persist(&self, path: &Path) -> Result<(), HcrError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let map: HashMap<String, f32> = self
            .scores
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        std::fs::write(path, serde_json::to_string(&map)?)?;
        Ok(())
    }
}

/// Embedder backed by previously persisted embeddings, resolved by text hash.
///
/// Built from one or more `EmbeddingStore` keys whose identifier files hold
/// `text_key` values. Unknown texts embed as zero vectors: a degraded score,
/// not an error, per the per-query contract.
#[derive(Debug, Default)]
pub struct StoredEmbedder {
    by_key: HashMap<String, Vec<f32>>,
    dim: usize,
}

impl StoredEmbedder {
    /// Create an empty stored embedder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a text's embedding. The vector is L2-normalized on entry.
    pub fn insert_text(&mut self, text: &str, embedding: &[f32]) {
        self.insert_key(text_key(text), embedding);
    }

    /// Register an embedding under a precomputed `text_key`.
    pub fn insert_key(&mut self, key: String, embedding: &[f32]) {
        if self.dim == 0 {
            self.dim = embedding.len();
        }
        self.by_key.insert(key, vecmath::l2_normalized(embedding));
    }

    /// Merge a whole store key (identifier file must contain text keys).
    pub fn load_store(&mut self, store: &EmbeddingStore, key: &str) -> Result<(), HcrError> {
        if let Some((ids, rows)) = store.load(key)? {
            for (id, row) in ids.into_iter().zip(rows) {
                self.insert_key(id, &row);
            }
        }
        Ok(())
    }

    /// Embedding dimension, 0 until the first insert.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl TextEmbedder for StoredEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HcrError> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, HcrError> {
        Ok(self
            .by_key
            .get(&text_key(text))
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dim]))
    }
}
