//! Beam search traversal over the summary tree.
//!
//! Level-synchronous descent: every non-leaf beam entry expands through the
//! scoring cascade, child scores are smoothed against the parent's path
//! score, and the next beam is the diversity-aware top-`beam_width` of the
//! new candidates plus any leaves carried forward. The per-level beam
//! contents are recorded for routing-accuracy measurement.

use std::collections::BTreeMap;

use hcr_core::{HcrError, Tree};

use crate::cascade::ScoringCascade;
use crate::path_score::{path_relevance_ema, DEFAULT_ALPHA};

/// Default beam width.
pub const DEFAULT_BEAM_WIDTH: usize = 3;

/// Default diversity penalty for paths sharing a parent.
pub const DEFAULT_DIVERSITY_LAMBDA: f32 = 0.3;

/// A single entry in the beam: node + accumulated path score.
#[derive(Debug, Clone)]
pub struct BeamEntry {
    /// Node at the tip of this path.
    pub node_id: String,
    /// Smoothed path-relevance score.
    pub path_score: f32,
    /// Depth of the node below the root.
    pub depth: u32,
}

/// Result of a beam traversal.
#[derive(Debug, Clone, Default)]
pub struct BeamSearchResult {
    /// Leaf nodes reached, in final beam order.
    pub leaf_node_ids: Vec<String>,
    /// Path scores aligned with `leaf_node_ids`.
    pub leaf_scores: Vec<f32>,
    /// Beam contents per level, in strictly increasing level order.
    pub beam_per_level: BTreeMap<u32, Vec<String>>,
}

/// Beam search with MMR-style diversity enforcement.
pub struct BeamSearch<'a> {
    tree: &'a Tree,
    cascade: &'a ScoringCascade<'a>,
    beam_width: usize,
    diversity_lambda: f32,
}

impl<'a> BeamSearch<'a> {
    /// Create a traversal with default width 3 and diversity lambda 0.3.
    pub fn new(tree: &'a Tree, cascade: &'a ScoringCascade<'a>) -> Self {
        Self {
            tree,
            cascade,
            beam_width: DEFAULT_BEAM_WIDTH,
            diversity_lambda: DEFAULT_DIVERSITY_LAMBDA,
        }
    }

    /// Override beam width and diversity penalty.
    pub fn with_search_params(mut self, beam_width: usize, diversity_lambda: f32) -> Self {
        self.beam_width = beam_width;
        self.diversity_lambda = diversity_lambda;
        self
    }

    /// Traverse the tree from the root, returning the surviving leaf paths.
    pub fn traverse(&self, query: &str, query_vec: &[f32]) -> Result<BeamSearchResult, HcrError> {
        let root = self.tree.root();
        let mut beam = vec![BeamEntry {
            node_id: root.id.clone(),
            path_score: 1.0,
            depth: 0,
        }];
        let mut beam_per_level: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        beam_per_level.insert(0, vec![root.id.clone()]);

        loop {
            // Expand all non-leaf entries; carry leaves forward unchanged
            let mut candidates: Vec<BeamEntry> = Vec::new();
            let mut leaves: Vec<BeamEntry> = Vec::new();

            for entry in &beam {
                let Some(node) = self.tree.get(&entry.node_id) else {
                    continue;
                };
                if node.is_leaf {
                    leaves.push(entry.clone());
                    continue;
                }

                let child_scores =
                    self.cascade
                        .score_children(query, query_vec, self.tree, node)?;
                for (child_id, score) in child_scores {
                    let smoothed = path_relevance_ema(score, entry.path_score, DEFAULT_ALPHA);
                    candidates.push(BeamEntry {
                        node_id: child_id,
                        path_score: smoothed,
                        depth: entry.depth + 1,
                    });
                }
            }

            if candidates.is_empty() {
                // All beam entries are leaves (or dead ends)
                return Ok(BeamSearchResult {
                    leaf_node_ids: leaves.iter().map(|e| e.node_id.clone()).collect(),
                    leaf_scores: leaves.iter().map(|e| e.path_score).collect(),
                    beam_per_level,
                });
            }

            let level = candidates[0].depth;
            let mut pool = candidates;
            pool.extend(leaves);
            beam = self.select_diverse_beam(pool);

            beam_per_level.insert(level, beam.iter().map(|e| e.node_id.clone()).collect());

            let all_leaves = beam
                .iter()
                .all(|e| self.tree.get(&e.node_id).is_some_and(|n| n.is_leaf));
            if all_leaves {
                return Ok(BeamSearchResult {
                    leaf_node_ids: beam.iter().map(|e| e.node_id.clone()).collect(),
                    leaf_scores: beam.iter().map(|e| e.path_score).collect(),
                    beam_per_level,
                });
            }
        }
    }

    /// Greedy diversity-aware selection of the next beam.
    ///
    /// Picks the best-scoring entry, then repeatedly the entry maximizing
    /// `score - penalty`, where the penalty is `diversity_lambda` when the
    /// entry shares any parent with an already-selected one.
    fn select_diverse_beam(&self, mut candidates: Vec<BeamEntry>) -> Vec<BeamEntry> {
        if candidates.len() <= self.beam_width {
            return candidates;
        }

        candidates.sort_by(|a, b| {
            b.path_score
                .partial_cmp(&a.path_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut selected = vec![candidates.remove(0)];
        let mut remaining = candidates;

        while selected.len() < self.beam_width && !remaining.is_empty() {
            let mut best_idx = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (i, candidate) in remaining.iter().enumerate() {
                let mut penalty = 0.0;
                for chosen in &selected {
                    if self.share_parent(&candidate.node_id, &chosen.node_id) {
                        penalty = self.diversity_lambda;
                        break;
                    }
                }
                let adjusted = candidate.path_score - penalty;
                if adjusted > best_score {
                    best_score = adjusted;
                    best_idx = i;
                }
            }

            selected.push(remaining.remove(best_idx));
        }

        selected
    }

    /// Whether two nodes share any parent.
    fn share_parent(&self, node_a: &str, node_b: &str) -> bool {
        let (Some(a), Some(b)) = (self.tree.get(node_a), self.tree.get(node_b)) else {
            return false;
        };
        a.parent_ids.iter().any(|p| b.parent_ids.contains(p))
    }
}
