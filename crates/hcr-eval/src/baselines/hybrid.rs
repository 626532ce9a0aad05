//! Hybrid baseline: RRF fusion of BM25 + dense with greedy token packing.

use hcr_core::provider::TextEmbedder;
use hcr_core::{Chunk, HcrError};
use hcr_retrieve::{Bm25Index, DenseIndex, HybridIndex};

use super::{greedy_token_pack, RetrievalBaseline, DEFAULT_RANK_K};

/// Hybrid BM25+dense (RRF) retrieval + greedy token packing.
pub struct HybridBaseline<'a> {
    chunks: &'a [Chunk],
    index: HybridIndex,
    embedder: &'a dyn TextEmbedder,
}

impl<'a> HybridBaseline<'a> {
    /// Build the baseline over a shared corpus and its embeddings.
    pub fn new(
        chunks: &'a [Chunk],
        embeddings: Vec<Vec<f32>>,
        embedder: &'a dyn TextEmbedder,
    ) -> Result<Self, HcrError> {
        let bm25 = Bm25Index::new(chunks);
        let dense = DenseIndex::from_chunks(chunks, embeddings)?;
        Ok(Self {
            chunks,
            index: HybridIndex::new(bm25, dense),
            embedder,
        })
    }
}

impl RetrievalBaseline for HybridBaseline<'_> {
    fn name(&self) -> &str {
        "hybrid-rrf"
    }

    fn rank(&self, query: &str, top_k: usize) -> Result<Vec<(String, f32)>, HcrError> {
        let query_vec = self.embedder.embed_text(query)?;
        Ok(self.index.search(query, &query_vec, top_k))
    }

    fn retrieve(&self, query: &str, token_budget: u32) -> Result<Vec<Chunk>, HcrError> {
        let ranked = self.rank(query, DEFAULT_RANK_K)?;
        Ok(greedy_token_pack(self.chunks, &ranked, token_budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MapEmbedder;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk::new(id, "doc", content, content.split_whitespace().count() as u32).unwrap()
    }

    #[test]
    fn test_hybrid_fuses_lexical_and_dense_signals() {
        let chunks = vec![
            chunk("c1", "python machine learning"),
            chunk("c2", "java web"),
            chunk("c3", "python data"),
        ];
        // c1 is the top dense match for "python"
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.4, 0.4, 0.2],
        ];
        let embedder = MapEmbedder::new(&[("python", vec![1.0, 0.0, 0.0])]);
        let baseline = HybridBaseline::new(&chunks, embeddings, &embedder).unwrap();

        let ranked = baseline.rank("python", 2).unwrap();
        let top_ids: Vec<&str> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        assert!(top_ids.contains(&"c1"));
    }

    #[test]
    fn test_retrieve_packs_within_budget() {
        let chunks = vec![
            chunk("c1", "python machine learning"),
            chunk("c2", "java web"),
            chunk("c3", "python data"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.4, 0.4, 0.2],
        ];
        let embedder = MapEmbedder::new(&[("python", vec![1.0, 0.0, 0.0])]);
        let baseline = HybridBaseline::new(&chunks, embeddings, &embedder).unwrap();

        let packed = baseline.retrieve("python", 5).unwrap();
        assert!(packed.iter().map(|c| c.token_count).sum::<u32>() <= 5);
    }

    #[test]
    fn test_mismatched_embeddings_rejected() {
        let chunks = vec![chunk("c1", "text")];
        let embedder = MapEmbedder::new(&[]);
        assert!(HybridBaseline::new(&chunks, vec![], &embedder).is_err());
    }
}
