//! Exact dense retrieval over L2-normalized embeddings.
//!
//! Brute-force inner-product search: O(n*d) per query. For normalized
//! vectors the inner product equals cosine similarity. Exact search keeps
//! the evaluation deterministic; there is no approximation to tune.

use hcr_core::{vecmath, Chunk, HcrError};

/// Dense index over L2-normalized chunk embeddings.
#[derive(Debug)]
pub struct DenseIndex {
    /// Chunk identifiers in corpus order (row -> id).
    chunk_ids: Vec<String>,
    /// Normalized embedding rows, aligned with `chunk_ids`.
    embeddings: Vec<Vec<f32>>,
}

impl DenseIndex {
    /// Build an index from embeddings and their chunk identifiers.
    ///
    /// Rows are renormalized on entry so downstream scoring can assume unit
    /// length.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `chunk_ids` and `embeddings` disagree in
    /// length, or when rows are ragged.
    pub fn new(embeddings: Vec<Vec<f32>>, chunk_ids: Vec<String>) -> Result<Self, HcrError> {
        if chunk_ids.len() != embeddings.len() {
            return Err(HcrError::DimensionMismatch {
                expected: chunk_ids.len(),
                actual: embeddings.len(),
            });
        }
        let dim = embeddings.first().map_or(0, Vec::len);
        let mut normalized = Vec::with_capacity(embeddings.len());
        for row in embeddings {
            if row.len() != dim {
                return Err(HcrError::DimensionMismatch {
                    expected: dim,
                    actual: row.len(),
                });
            }
            normalized.push(vecmath::l2_normalized(&row));
        }
        Ok(Self {
            chunk_ids,
            embeddings: normalized,
        })
    }

    /// Build an index aligned with a chunk slice.
    pub fn from_chunks(chunks: &[Chunk], embeddings: Vec<Vec<f32>>) -> Result<Self, HcrError> {
        let ids = chunks.iter().map(|c| c.id.clone()).collect();
        Self::new(embeddings, ids)
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.chunk_ids.len()
    }

    /// Whether the index holds no rows.
    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }

    /// Retrieve the top-k chunks by inner product, descending.
    ///
    /// The query vector is renormalized on entry. `k` is capped at N.
    /// Negative similarities are legal and kept: the contract is top-k by
    /// score, not top-k above zero.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(String, f32)> {
        if self.chunk_ids.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query = vecmath::l2_normalized(query);

        let mut scored: Vec<(String, f32)> = self
            .chunk_ids
            .iter()
            .zip(self.embeddings.iter())
            .map(|(id, row)| (id.clone(), vecmath::dot(&query, row)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k.min(self.chunk_ids.len()));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_ranking() {
        let index = DenseIndex::new(
            vec![vec![1.0, 0.0], vec![0.707, 0.707], vec![0.0, 1.0]],
            vec!["c-0".to_string(), "c-1".to_string(), "c-2".to_string()],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0], 10);
        assert_eq!(results[0].0, "c-0");
        assert!((results[0].1 - 1.0).abs() < 1e-3);
        assert_eq!(results[1].0, "c-1");
        assert!((results[1].1 - 0.707).abs() < 1e-2);
    }

    #[test]
    fn test_dense_query_renormalized() {
        let index = DenseIndex::new(
            vec![vec![1.0, 0.0]],
            vec!["c-0".to_string()],
        )
        .unwrap();
        // Unnormalized query must score identically to its unit version
        let results = index.search(&[5.0, 0.0], 1);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dense_k_capped_at_n() {
        let index = DenseIndex::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec!["c-0".to_string(), "c-1".to_string()],
        )
        .unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 100).len(), 2);
    }

    #[test]
    fn test_dense_negative_scores_kept() {
        let index = DenseIndex::new(
            vec![vec![-1.0, 0.0], vec![0.0, 1.0]],
            vec!["c-0".to_string(), "c-1".to_string()],
        )
        .unwrap();
        let results = index.search(&[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].0, "c-0");
        assert!((results[1].1 + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dense_count_mismatch_rejected() {
        let err = DenseIndex::new(vec![vec![1.0]], vec![]).unwrap_err();
        assert!(matches!(err, HcrError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_dense_ragged_rows_rejected() {
        let err = DenseIndex::new(
            vec![vec![1.0, 0.0], vec![1.0]],
            vec!["c-0".to_string(), "c-1".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, HcrError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_dense_empty_index() {
        let index = DenseIndex::new(vec![], vec![]).unwrap();
        assert!(index.search(&[1.0, 0.0], 10).is_empty());
    }
}
