//! Collapsed-tree retrieval: flat search over all node summaries.
//!
//! Co-primary strategy alongside beam search, not a fallback: it catches
//! queries the beam loses to early routing mistakes by ranking every
//! summary-bearing node directly, reranking the top few with the
//! cross-encoder, and expanding the winners to their leaf descendants.

use hcr_core::{vecmath, HcrError, Tree};

use crate::scorer::CrossEncoderScorer;

/// Default number of summary nodes sent to the cross-encoder.
pub const DEFAULT_COLLAPSED_TOP_K: usize = 10;

/// Result of collapsed-tree retrieval.
#[derive(Debug, Clone, Default)]
pub struct CollapsedResult {
    /// Leaf nodes, in descending order of their best ancestor's rerank score.
    pub leaf_node_ids: Vec<String>,
    /// Scores aligned with `leaf_node_ids` (the ancestor's rerank score).
    pub leaf_scores: Vec<f32>,
    /// Top cross-encoder score, 0.0 when nothing matched.
    pub confidence: f32,
}

/// Flat retrieval over all summary nodes, bypassing tree structure.
pub struct CollapsedRetrieval<'a> {
    tree: &'a Tree,
    scorer: &'a CrossEncoderScorer<'a>,
    top_k: usize,
}

impl<'a> CollapsedRetrieval<'a> {
    /// Create a collapsed retrieval with the default `top_k = 10`.
    pub fn new(tree: &'a Tree, scorer: &'a CrossEncoderScorer<'a>) -> Self {
        Self {
            tree,
            scorer,
            top_k: DEFAULT_COLLAPSED_TOP_K,
        }
    }

    /// Override the rerank candidate count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Flat search: score all summaries, rerank, expand to leaves.
    pub fn retrieve(&self, query: &str, query_vec: &[f32]) -> Result<CollapsedResult, HcrError> {
        // Score every node that carries a summary embedding
        let mut scored: Vec<(String, f32)> = self
            .tree
            .nodes
            .values()
            .filter_map(|node| {
                let emb = node.summary_embedding.as_ref()?;
                let normalized = vecmath::l2_normalized(emb);
                Some((node.id.clone(), vecmath::dot(query_vec, &normalized)))
            })
            .collect();
        // Arena iteration has no inherent order; break score ties on id so
        // the ranking is deterministic
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(self.top_k);

        if scored.is_empty() {
            return Ok(CollapsedResult::default());
        }

        // Cross-encoder rerank over theme/includes surfaces
        let mut ids: Vec<String> = Vec::with_capacity(scored.len());
        let mut texts: Vec<String> = Vec::with_capacity(scored.len());
        for (node_id, _) in &scored {
            let Some(node) = self.tree.get(node_id) else {
                continue;
            };
            if let Some(summary) = &node.summary {
                ids.push(node_id.clone());
                texts.push(format!(
                    "Theme: {}. Includes: {}.",
                    summary.theme,
                    summary.includes.join(", ")
                ));
            }
        }
        if texts.is_empty() {
            return Ok(CollapsedResult::default());
        }

        let ce_scores = self.scorer.score_batch(query, &texts, &ids)?;
        let mut reranked: Vec<(String, f32)> = ids.into_iter().zip(ce_scores).collect();
        reranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        // Expand winners to leaf descendants; a leaf reachable through
        // several summary nodes keeps its highest-ranked ancestor's score
        let mut leaf_ids: Vec<String> = Vec::new();
        let mut leaf_scores: Vec<f32> = Vec::new();
        for (node_id, score) in &reranked {
            for leaf_id in self.tree.descendant_leaves(node_id) {
                if !leaf_ids.contains(&leaf_id) {
                    leaf_ids.push(leaf_id);
                    leaf_scores.push(*score);
                }
            }
        }

        let confidence = reranked.first().map_or(0.0, |(_, score)| *score);

        Ok(CollapsedResult {
            leaf_node_ids: leaf_ids,
            leaf_scores,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::tests::{fixture_tree, KeywordModel};
    use crate::scorer::CrossEncoderScorer;
    use hcr_core::store::CeScoreCache;

    #[test]
    fn test_collapsed_finds_matching_branch_leaves() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let tree = fixture_tree();
        let collapsed = CollapsedRetrieval::new(&tree, &scorer);

        // Theme surface of branch-a is "Theme: apples. Includes: apples."
        let result = collapsed.retrieve("apples", &[1.0, 0.0, 0.0, 0.0]).unwrap();

        assert!(!result.leaf_node_ids.is_empty());
        assert!(result.confidence > 0.0);
        // Leaves under branch-a arrive before leaves under branch-b
        let a1 = result.leaf_node_ids.iter().position(|l| l == "leaf-a1");
        let b1 = result.leaf_node_ids.iter().position(|l| l == "leaf-b1");
        assert!(a1.is_some());
        if let (Some(a), Some(b)) = (a1, b1) {
            assert!(a < b);
        }
    }

    #[test]
    fn test_leaf_keeps_highest_ranked_ancestor_score() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let tree = fixture_tree();
        let collapsed = CollapsedRetrieval::new(&tree, &scorer);

        let result = collapsed.retrieve("apples", &[1.0, 0.0, 0.0, 0.0]).unwrap();

        // leaf-a1 is reachable via both the root and branch-a; it appears
        // once and keeps the highest-ranked ancestor's score
        let occurrences = result
            .leaf_node_ids
            .iter()
            .filter(|l| *l == "leaf-a1")
            .count();
        assert_eq!(occurrences, 1);
        let idx = result
            .leaf_node_ids
            .iter()
            .position(|l| l == "leaf-a1")
            .unwrap();
        assert_eq!(result.leaf_scores[idx], result.confidence);
    }

    #[test]
    fn test_confidence_is_top_rerank_score() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let tree = fixture_tree();
        let collapsed = CollapsedRetrieval::new(&tree, &scorer);

        let result = collapsed.retrieve("apples", &[1.0, 0.0, 0.0, 0.0]).unwrap();
        // The top leaf carries the confidence score
        assert_eq!(result.leaf_scores[0], result.confidence);
    }

    #[test]
    fn test_no_matches_zero_confidence() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let tree = fixture_tree();
        let collapsed = CollapsedRetrieval::new(&tree, &scorer);

        // Query matches no theme: CE scores all zero, confidence zero
        let result = collapsed.retrieve("zeppelins", &[0.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_top_k_limits_rerank_set() {
        let cache = CeScoreCache::new();
        let scorer = CrossEncoderScorer::new(&KeywordModel, &cache);
        let tree = fixture_tree();
        let collapsed = CollapsedRetrieval::new(&tree, &scorer).with_top_k(1);

        let result = collapsed.retrieve("apples", &[1.0, 0.0, 0.0, 0.0]).unwrap();
        // Only the single best summary node expanded: exactly its two leaves
        assert_eq!(result.leaf_node_ids.len(), 2);
    }
}
