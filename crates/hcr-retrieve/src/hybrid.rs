//! Hybrid retrieval: reciprocal-rank fusion of BM25 and dense results.
//!
//! RRF combines rankings without comparing raw scores across sources: each
//! candidate contributes `1 / (rrf_k + rank)` per source (1-based rank) and
//! the contributions sum. Candidates present in only one source still count.

use std::collections::HashMap;

use crate::{Bm25Index, DenseIndex};

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: usize = 60;

/// Hybrid index fusing BM25 and dense search via RRF.
pub struct HybridIndex {
    bm25: Bm25Index,
    dense: DenseIndex,
    rrf_k: usize,
}

impl HybridIndex {
    /// Build a hybrid index over the two source indexes with `rrf_k = 60`.
    pub fn new(bm25: Bm25Index, dense: DenseIndex) -> Self {
        Self::with_rrf_k(bm25, dense, DEFAULT_RRF_K)
    }

    /// Build a hybrid index with an explicit smoothing constant.
    pub fn with_rrf_k(bm25: Bm25Index, dense: DenseIndex, rrf_k: usize) -> Self {
        Self {
            bm25,
            dense,
            rrf_k,
        }
    }

    /// Retrieve the top-k chunks by fused score, descending.
    ///
    /// Fetches a `3 * top_k` pool from each source. Ties break by first-seen
    /// order (BM25 pool first, then dense), which keeps the fusion
    /// deterministic.
    pub fn search(&self, query: &str, query_vec: &[f32], top_k: usize) -> Vec<(String, f32)> {
        if top_k == 0 {
            return Vec::new();
        }
        let pool_k = top_k * 3;
        let bm25_results = self.bm25.search(query, pool_k);
        let dense_results = self.dense.search(query_vec, pool_k);

        // Insertion-ordered accumulation so equal fused scores keep a stable
        // first-seen tiebreak.
        let mut order: Vec<String> = Vec::new();
        let mut fused: HashMap<String, f32> = HashMap::new();

        for source in [&bm25_results, &dense_results] {
            for (rank, (chunk_id, _)) in source.iter().enumerate() {
                let contribution = 1.0 / (self.rrf_k as f32 + rank as f32 + 1.0);
                match fused.get_mut(chunk_id) {
                    Some(score) => *score += contribution,
                    None => {
                        order.push(chunk_id.clone());
                        fused.insert(chunk_id.clone(), contribution);
                    }
                }
            }
        }

        let mut scored: Vec<(String, f32)> = order
            .into_iter()
            .map(|id| {
                let score = fused[&id];
                (id, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcr_core::Chunk;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk::new(id, "doc", content, content.split_whitespace().count() as u32).unwrap()
    }

    fn build_index() -> HybridIndex {
        let chunks = vec![
            chunk("c-1", "python machine learning"),
            chunk("c-2", "java web"),
            chunk("c-3", "python data"),
        ];
        // c-1 is the top dense match for the query vector below
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.5, 0.5, 0.0],
        ];
        let ids = chunks.iter().map(|c| c.id.clone()).collect();
        HybridIndex::new(
            Bm25Index::new(&chunks),
            DenseIndex::new(embeddings, ids).unwrap(),
        )
    }

    #[test]
    fn test_rrf_fuses_both_sources() {
        let index = build_index();
        let results = index.search("python", &[1.0, 0.0, 0.0], 2);
        // c-1 matches "python" lexically and is the top dense hit
        let top_ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert!(top_ids.contains(&"c-1"));
    }

    #[test]
    fn test_rrf_scores_sorted_descending() {
        let index = build_index();
        let results = index.search("python data", &[0.5, 0.5, 0.0], 3);
        for window in results.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn test_rrf_single_source_candidate_counts() {
        let index = build_index();
        // "java" only matches c-2 lexically; c-2 still appears in the fusion
        let results = index.search("java", &[1.0, 0.0, 0.0], 3);
        assert!(results.iter().any(|(id, _)| id == "c-2"));
    }

    #[test]
    fn test_rrf_contribution_formula() {
        let index = build_index();
        let results = index.search("python machine learning", &[1.0, 0.0, 0.0], 3);
        // Best possible fused score: rank 1 in both sources
        let max_score = 2.0 / (DEFAULT_RRF_K as f32 + 1.0);
        assert!(results[0].1 <= max_score + 1e-6);
        assert!(results[0].1 > 0.0);
    }

    #[test]
    fn test_rrf_top_k_zero() {
        let index = build_index();
        assert!(index.search("python", &[1.0, 0.0, 0.0], 0).is_empty());
    }
}
