//! HCR baseline: tree-based dual-path retrieval (beam search + collapsed tree).
//!
//! This is the system under test. It wraps the dual-path traversal in the
//! baseline interface, maps surviving leaf nodes to chunk identifiers, and
//! records per-level beam contents per query for epsilon measurement.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use hcr_core::provider::TextEmbedder;
use hcr_core::{Chunk, HcrError, Tree};
use hcr_traverse::beam::{DEFAULT_BEAM_WIDTH, DEFAULT_DIVERSITY_LAMBDA};
use hcr_traverse::{
    BeamSearch, CollapsedRetrieval, CrossEncoderScorer, DualPath, ScoringCascade,
};

use super::{greedy_token_pack, RetrievalBaseline, DEFAULT_RANK_K};

/// Per-query beam contents, keyed by query id, for epsilon measurement.
pub type BeamRecords = HashMap<String, BTreeMap<u32, Vec<String>>>;

/// HCR dual-path retrieval: beam search + collapsed tree race.
pub struct HcrBaseline<'a> {
    chunks: &'a [Chunk],
    tree: &'a Tree,
    embedder: &'a dyn TextEmbedder,
    scorer: &'a CrossEncoderScorer<'a>,
    /// chunk_id -> embedding, for leaf scoring in the cascade.
    chunk_embeddings: HashMap<String, Vec<f32>>,
    /// chunk_id -> content, for leaf cross-encoder surfaces.
    chunk_texts: HashMap<String, String>,
    /// leaf node id -> chunk id.
    leaf_to_chunk: HashMap<String, String>,
    beam_width: usize,
    diversity_lambda: f32,
    /// Last query's beam, promoted into `beam_records` by
    /// `store_beam_record`.
    last_beam: RefCell<BTreeMap<u32, Vec<String>>>,
    beam_records: RefCell<BeamRecords>,
}

impl<'a> std::fmt::Debug for HcrBaseline<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HcrBaseline")
            .field("chunks", &self.chunks)
            .field("tree", &self.tree)
            .field("chunk_embeddings", &self.chunk_embeddings)
            .field("chunk_texts", &self.chunk_texts)
            .field("leaf_to_chunk", &self.leaf_to_chunk)
            .field("beam_width", &self.beam_width)
            .field("diversity_lambda", &self.diversity_lambda)
            .field("last_beam", &self.last_beam)
            .field("beam_records", &self.beam_records)
            .finish_non_exhaustive()
    }
}

impl<'a> HcrBaseline<'a> {
    /// Build the baseline over a shared tree, corpus, and embeddings.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `chunks` and `embeddings` disagree in length.
    pub fn new(
        tree: &'a Tree,
        chunks: &'a [Chunk],
        embeddings: &[Vec<f32>],
        embedder: &'a dyn TextEmbedder,
        scorer: &'a CrossEncoderScorer<'a>,
    ) -> Result<Self, HcrError> {
        if chunks.len() != embeddings.len() {
            return Err(HcrError::DimensionMismatch {
                expected: chunks.len(),
                actual: embeddings.len(),
            });
        }

        let chunk_embeddings = chunks
            .iter()
            .zip(embeddings)
            .map(|(c, e)| (c.id.clone(), e.clone()))
            .collect();
        let chunk_texts = chunks
            .iter()
            .map(|c| (c.id.clone(), c.content.clone()))
            .collect();
        let leaf_to_chunk = tree
            .nodes
            .values()
            .filter(|n| n.is_leaf)
            .filter_map(|n| Some((n.id.clone(), n.chunk_id.clone()?)))
            .collect();

        Ok(Self {
            chunks,
            tree,
            embedder,
            scorer,
            chunk_embeddings,
            chunk_texts,
            leaf_to_chunk,
            beam_width: DEFAULT_BEAM_WIDTH,
            diversity_lambda: DEFAULT_DIVERSITY_LAMBDA,
            last_beam: RefCell::new(BTreeMap::new()),
            beam_records: RefCell::new(HashMap::new()),
        })
    }

    /// Override beam width and diversity penalty.
    pub fn with_search_params(mut self, beam_width: usize, diversity_lambda: f32) -> Self {
        self.beam_width = beam_width;
        self.diversity_lambda = diversity_lambda;
        self
    }

    /// Store the last query's beam contents under a query id.
    ///
    /// Call right after `rank` for the query being evaluated.
    pub fn store_beam_record(&self, query_id: &str) {
        self.beam_records
            .borrow_mut()
            .insert(query_id.to_string(), self.last_beam.borrow().clone());
    }

    /// Recorded beam contents for epsilon measurement.
    pub fn beam_records(&self) -> BeamRecords {
        self.beam_records.borrow().clone()
    }
}

impl RetrievalBaseline for HcrBaseline<'_> {
    fn name(&self) -> &str {
        "hcr"
    }

    fn rank(&self, query: &str, top_k: usize) -> Result<Vec<(String, f32)>, HcrError> {
        let query_vec = self.embedder.embed_text(query)?;

        // The traversal stack is a set of borrows over shared state,
        // rebuilt per query
        let cascade =
            ScoringCascade::new(self.scorer, &self.chunk_embeddings, &self.chunk_texts);
        let beam = BeamSearch::new(self.tree, &cascade)
            .with_search_params(self.beam_width, self.diversity_lambda);
        let collapsed = CollapsedRetrieval::new(self.tree, self.scorer);
        let dual = DualPath::new(beam, collapsed);

        let result = dual.retrieve(query, &query_vec)?;
        *self.last_beam.borrow_mut() = result.beam.beam_per_level.clone();

        // Resolve leaves to chunk ids, deduplicated first-occurrence-wins.
        // Diversity selection can interleave scores, so restore the
        // rank-output contract with a stable descending sort.
        let mut ranked: Vec<(String, f32)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (leaf_id, score) in result.leaf_node_ids.iter().zip(&result.leaf_scores) {
            let Some(chunk_id) = self.leaf_to_chunk.get(leaf_id) else {
                continue;
            };
            if seen.insert(chunk_id.as_str()) {
                ranked.push((chunk_id.clone(), *score));
            }
        }
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        Ok(ranked)
    }

    fn retrieve(&self, query: &str, token_budget: u32) -> Result<Vec<Chunk>, HcrError> {
        let ranked = self.rank(query, DEFAULT_RANK_K)?;
        Ok(greedy_token_pack(self.chunks, &ranked, token_budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        two_branch_chunks, two_branch_embeddings, two_branch_tree, KeywordModel, MapEmbedder,
    };
    use hcr_core::store::CeScoreCache;

    fn embedder() -> MapEmbedder {
        MapEmbedder::new(&[
            ("apples orchard", vec![1.0, 0.0]),
            ("suspension bridges", vec![0.0, 1.0]),
        ])
    }

    #[test]
    fn test_rank_returns_chunk_ids_from_matching_branch() {
        let tree = two_branch_tree();
        let chunks = two_branch_chunks();
        let embeddings = two_branch_embeddings();
        let embedder = embedder();
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let baseline =
            HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

        let ranked = baseline.rank("apples orchard", 50).unwrap();
        assert!(!ranked.is_empty());
        // Top result resolves to the apples chunk, not a leaf node id
        assert_eq!(ranked[0].0, "c-a1");
    }

    #[test]
    fn test_rank_deduplicates_chunk_ids() {
        let tree = two_branch_tree();
        let chunks = two_branch_chunks();
        let embeddings = two_branch_embeddings();
        let embedder = embedder();
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let baseline =
            HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

        let ranked = baseline.rank("suspension bridges", 50).unwrap();
        let mut ids: Vec<&String> = ranked.iter().map(|(id, _)| id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ranked.len());
        // Scores come out non-increasing even when diversity selection
        // interleaved the beam
        for window in ranked.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn test_beam_records_stored_per_query() {
        let tree = two_branch_tree();
        let chunks = two_branch_chunks();
        let embeddings = two_branch_embeddings();
        let embedder = embedder();
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let baseline =
            HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

        baseline.rank("apples orchard", 50).unwrap();
        baseline.store_beam_record("q-0");
        baseline.rank("suspension bridges", 50).unwrap();
        baseline.store_beam_record("q-1");

        let records = baseline.beam_records();
        assert_eq!(records.len(), 2);
        // Level 0 is always the root
        assert_eq!(records["q-0"][&0], vec!["root".to_string()]);
        assert!(records["q-1"].contains_key(&1));
    }

    #[test]
    fn test_retrieve_packs_chunks() {
        let tree = two_branch_tree();
        let chunks = two_branch_chunks();
        let embeddings = two_branch_embeddings();
        let embedder = embedder();
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let baseline =
            HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

        let packed = baseline.retrieve("apples orchard", 8).unwrap();
        assert!(packed.iter().map(|c| c.token_count).sum::<u32>() <= 8);
        assert!(!packed.is_empty());
    }

    #[test]
    fn test_embedding_count_mismatch_rejected() {
        let tree = two_branch_tree();
        let chunks = two_branch_chunks();
        let embedder = embedder();
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let err = HcrBaseline::new(&tree, &chunks, &[], &embedder, &scorer).unwrap_err();
        assert!(matches!(err, HcrError::DimensionMismatch { .. }));
    }
}
