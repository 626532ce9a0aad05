//! BM25 baseline: sparse keyword retrieval with greedy token packing.

use hcr_core::{Chunk, HcrError};
use hcr_retrieve::Bm25Index;

use super::{greedy_token_pack, RetrievalBaseline, DEFAULT_RANK_K};

/// BM25 keyword retrieval + greedy token packing.
pub struct Bm25Baseline<'a> {
    chunks: &'a [Chunk],
    index: Bm25Index,
}

impl<'a> Bm25Baseline<'a> {
    /// Build the baseline over a shared corpus.
    pub fn new(chunks: &'a [Chunk]) -> Self {
        Self {
            chunks,
            index: Bm25Index::new(chunks),
        }
    }
}

impl RetrievalBaseline for Bm25Baseline<'_> {
    fn name(&self) -> &str {
        "bm25"
    }

    fn rank(&self, query: &str, top_k: usize) -> Result<Vec<(String, f32)>, HcrError> {
        Ok(self.index.search(query, top_k))
    }

    fn retrieve(&self, query: &str, token_budget: u32) -> Result<Vec<Chunk>, HcrError> {
        let ranked = self.rank(query, DEFAULT_RANK_K)?;
        Ok(greedy_token_pack(self.chunks, &ranked, token_budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::two_branch_chunks;

    #[test]
    fn test_rank_finds_keyword_match() {
        let chunks = two_branch_chunks();
        let baseline = Bm25Baseline::new(&chunks);

        let ranked = baseline.rank("suspension bridges", 10).unwrap();
        assert_eq!(ranked[0].0, "c-b1");
        assert!(ranked[0].1 > 0.0);
    }

    #[test]
    fn test_retrieve_respects_budget() {
        let chunks = two_branch_chunks();
        let baseline = Bm25Baseline::new(&chunks);

        let packed = baseline.retrieve("apples orchard", 6).unwrap();
        assert!(packed.iter().map(|c| c.token_count).sum::<u32>() <= 6);
        assert!(!packed.is_empty());
    }

    #[test]
    fn test_empty_corpus_ranks_empty() {
        let baseline = Bm25Baseline::new(&[]);
        assert!(baseline.rank("anything", 10).unwrap().is_empty());
        assert!(baseline.retrieve("anything", 400).unwrap().is_empty());
    }
}
