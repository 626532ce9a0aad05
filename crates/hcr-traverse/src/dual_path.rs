//! Dual-path retrieval: beam search and collapsed tree race on every query.
//!
//! Both strategies run independently; whichever reports the higher
//! top-result confidence wins. The two confidences live on different scales
//! (the beam's is a smoothed path score, the collapsed one a raw
//! cross-encoder score); the comparison is a deliberate heuristic and both
//! sub-results are retained for diagnostics.

use hcr_core::HcrError;

use crate::beam::{BeamSearch, BeamSearchResult};
use crate::collapsed::{CollapsedResult, CollapsedRetrieval};

/// Which strategy produced the returned leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Beam search won (or tied).
    Beam,
    /// Collapsed retrieval won.
    Collapsed,
}

/// Result of dual-path retrieval.
#[derive(Debug, Clone)]
pub struct DualPathResult {
    /// Winning strategy's leaf nodes.
    pub leaf_node_ids: Vec<String>,
    /// Scores aligned with `leaf_node_ids`.
    pub leaf_scores: Vec<f32>,
    /// Which strategy won.
    pub strategy: Strategy,
    /// Full beam sub-result, kept for epsilon measurement and diagnostics.
    pub beam: BeamSearchResult,
    /// Full collapsed sub-result, kept for diagnostics.
    pub collapsed: CollapsedResult,
}

/// Runs beam search and collapsed retrieval, returning the higher-confidence
/// result.
pub struct DualPath<'a> {
    beam: BeamSearch<'a>,
    collapsed: CollapsedRetrieval<'a>,
}

impl<'a> DualPath<'a> {
    /// Pair a beam traversal with a collapsed retrieval.
    pub fn new(beam: BeamSearch<'a>, collapsed: CollapsedRetrieval<'a>) -> Self {
        Self { beam, collapsed }
    }

    /// Run both strategies and arbitrate.
    ///
    /// `beam_confidence = max(leaf_scores)` (0 when the beam found nothing);
    /// the beam wins ties.
    pub fn retrieve(&self, query: &str, query_vec: &[f32]) -> Result<DualPathResult, HcrError> {
        let beam_result = self.beam.traverse(query, query_vec)?;
        let collapsed_result = self.collapsed.retrieve(query, query_vec)?;

        let beam_confidence = beam_result
            .leaf_scores
            .iter()
            .copied()
            .fold(0.0f32, f32::max);

        if beam_confidence >= collapsed_result.confidence {
            Ok(DualPathResult {
                leaf_node_ids: beam_result.leaf_node_ids.clone(),
                leaf_scores: beam_result.leaf_scores.clone(),
                strategy: Strategy::Beam,
                beam: beam_result,
                collapsed: collapsed_result,
            })
        } else {
            Ok(DualPathResult {
                leaf_node_ids: collapsed_result.leaf_node_ids.clone(),
                leaf_scores: collapsed_result.leaf_scores.clone(),
                strategy: Strategy::Collapsed,
                beam: beam_result,
                collapsed: collapsed_result,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::tests::{
        fixture_chunk_embeddings, fixture_chunk_texts, fixture_tree, KeywordModel,
    };
    use crate::cascade::ScoringCascade;
    use crate::scorer::CrossEncoderScorer;
    use hcr_core::store::CeScoreCache;

    #[test]
    fn test_both_strategies_retained() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let embeddings = fixture_chunk_embeddings();
        let texts = fixture_chunk_texts();
        let cascade = ScoringCascade::new(&scorer, &embeddings, &texts);
        let tree = fixture_tree();
        let dual = DualPath::new(
            BeamSearch::new(&tree, &cascade),
            CollapsedRetrieval::new(&tree, &scorer),
        );

        let result = dual.retrieve("apples orchard", &[1.0, 0.0, 0.0, 0.0]).unwrap();

        // Diagnostics survive arbitration regardless of the winner
        assert!(!result.beam.beam_per_level.is_empty());
        assert!(!result.collapsed.leaf_node_ids.is_empty());
        assert!(!result.leaf_node_ids.is_empty());
    }

    #[test]
    fn test_beam_wins_ties() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let embeddings = fixture_chunk_embeddings();
        let texts = fixture_chunk_texts();
        let cascade = ScoringCascade::new(&scorer, &embeddings, &texts);
        let tree = fixture_tree();
        let dual = DualPath::new(
            BeamSearch::new(&tree, &cascade),
            CollapsedRetrieval::new(&tree, &scorer),
        );

        // A query matching nothing: collapsed confidence 0, beam max score > 0
        // (path EMA decays from the 1.0 seed), so the beam wins
        let result = dual.retrieve("zeppelins", &[0.0, 0.0, 1.0, 0.0]).unwrap();
        assert_eq!(result.strategy, Strategy::Beam);
    }

    #[test]
    fn test_collapsed_wins_on_higher_confidence() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let embeddings = fixture_chunk_embeddings();
        let texts = fixture_chunk_texts();
        let cascade = ScoringCascade::new(&scorer, &embeddings, &texts);
        let tree = fixture_tree();
        let dual = DualPath::new(
            BeamSearch::new(&tree, &cascade),
            CollapsedRetrieval::new(&tree, &scorer),
        );

        // "apples apples apples ..." inflates the CE keyword count on the
        // collapsed surface above any smoothed beam path score
        let spam = "apples apples apples apples apples";
        let result = dual.retrieve(spam, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(result.strategy, Strategy::Collapsed);
        assert_eq!(result.leaf_node_ids, result.collapsed.leaf_node_ids);
    }
}
