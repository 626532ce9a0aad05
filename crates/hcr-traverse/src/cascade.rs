//! Per-level scoring cascade: dense pre-filter + leaf-gated cross-encoder rerank.
//!
//! Stage 1 ranks a node's children by cosine similarity of their summary
//! embeddings (leaf children fall back to their chunk embedding) and keeps
//! the top `pre_filter_k`. Stage 2 reranks with the cross-encoder, but only
//! when every surviving candidate is a leaf: the cross-encoder is trained on
//! passage content and systematically under-scores structured summary text,
//! flipping correct routing decisions when applied to summaries.

use std::collections::HashMap;

use hcr_core::{vecmath, HcrError, Tree, TreeNode};

use crate::scorer::CrossEncoderScorer;

/// Default stage-1 survivor count.
pub const DEFAULT_PRE_FILTER_K: usize = 3;

/// Default stage-2 output count.
pub const DEFAULT_FINAL_K: usize = 2;

/// Per-level scoring cascade for tree traversal.
pub struct ScoringCascade<'a> {
    scorer: &'a CrossEncoderScorer<'a>,
    /// chunk_id -> normalized embedding, for scoring leaf children.
    chunk_embeddings: &'a HashMap<String, Vec<f32>>,
    /// chunk_id -> content, for leaf cross-encoder surfaces.
    chunk_texts: &'a HashMap<String, String>,
    pre_filter_k: usize,
    final_k: usize,
}

impl<'a> ScoringCascade<'a> {
    /// Create a cascade with default `pre_filter_k = 3`, `final_k = 2`.
    pub fn new(
        scorer: &'a CrossEncoderScorer<'a>,
        chunk_embeddings: &'a HashMap<String, Vec<f32>>,
        chunk_texts: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            scorer,
            chunk_embeddings,
            chunk_texts,
            pre_filter_k: DEFAULT_PRE_FILTER_K,
            final_k: DEFAULT_FINAL_K,
        }
    }

    /// Override stage sizes.
    pub fn with_stage_sizes(mut self, pre_filter_k: usize, final_k: usize) -> Self {
        self.pre_filter_k = pre_filter_k;
        self.final_k = final_k;
        self
    }

    /// Score the children of `parent`, returning `(child_id, score)` sorted
    /// descending, at most `final_k` entries.
    pub fn score_children(
        &self,
        query: &str,
        query_vec: &[f32],
        tree: &Tree,
        parent: &TreeNode,
    ) -> Result<Vec<(String, f32)>, HcrError> {
        let children: Vec<&TreeNode> = parent
            .child_ids
            .iter()
            .filter_map(|id| tree.get(id))
            .collect();
        if children.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 1: dense similarity pre-filter over all children
        let mut scored: Vec<(String, f32)> = children
            .iter()
            .map(|child| (child.id.clone(), self.dense_score(child, query_vec)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.pre_filter_k);

        // Stage 2 is gated to all-leaf survivor sets
        let survivors: Vec<&TreeNode> = scored
            .iter()
            .filter_map(|(id, _)| tree.get(id))
            .collect();
        let all_leaves = !survivors.is_empty() && survivors.iter().all(|n| n.is_leaf);
        if !all_leaves {
            scored.truncate(self.final_k);
            return Ok(scored);
        }

        let ids: Vec<String> = survivors
            .iter()
            .map(|node| self.cache_id(node))
            .collect();
        let texts: Vec<String> = survivors
            .iter()
            .map(|node| self.surface_text(node))
            .collect();

        let ce_scores = self.scorer.score_batch(query, &texts, &ids)?;

        let mut reranked: Vec<(String, f32)> = survivors
            .iter()
            .map(|node| node.id.clone())
            .zip(ce_scores)
            .collect();
        reranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        reranked.truncate(self.final_k);
        Ok(reranked)
    }

    /// Stage-1 score: summary embedding, else leaf chunk embedding, else 0.
    fn dense_score(&self, child: &TreeNode, query_vec: &[f32]) -> f32 {
        let embedding = match (&child.summary_embedding, &child.chunk_id) {
            (Some(emb), _) => Some(emb.as_slice()),
            (None, Some(chunk_id)) if child.is_leaf => self
                .chunk_embeddings
                .get(chunk_id)
                .map(Vec::as_slice),
            _ => None,
        };
        match embedding {
            Some(emb) => {
                let normalized = vecmath::l2_normalized(emb);
                vecmath::dot(query_vec, &normalized)
            }
            None => 0.0,
        }
    }

    /// Cross-encoder cache id: the chunk id for leaves (shared with the flat
    /// cross-encoder baseline), the node id for summary nodes.
    fn cache_id(&self, node: &TreeNode) -> String {
        match &node.chunk_id {
            Some(chunk_id) if node.is_leaf => chunk_id.clone(),
            _ => node.id.clone(),
        }
    }

    /// Cross-encoder text surface: chunk content for leaves, labeled theme /
    /// includes / excludes for summary nodes.
    fn surface_text(&self, node: &TreeNode) -> String {
        if node.is_leaf {
            return node
                .chunk_id
                .as_ref()
                .and_then(|id| self.chunk_texts.get(id))
                .cloned()
                .unwrap_or_default();
        }
        match &node.summary {
            Some(summary) => format!(
                "Theme: {}. Includes: {}. Excludes: {}.",
                summary.theme,
                summary.includes.join(", "),
                summary.excludes.join(", ")
            ),
            None => String::new(),
        }
    }
}
