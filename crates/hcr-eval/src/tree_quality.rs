//! Tree quality: sibling distinctiveness.
//!
//! If sibling summaries embed too close together, no scorer can route
//! between them; measuring this before running a full evaluation separates
//! tree problems from traversal problems.

use hcr_core::{vecmath, Tree};

/// Kill threshold: below this the tree is too homogeneous for routing.
pub const SIBLING_DISTINCTIVENESS_KILL: f64 = 0.15;

/// Mean pairwise cosine distance among sibling summary embeddings.
///
/// For every internal node with at least two summary-bearing children, all
/// pairwise cosine distances between the children's embeddings enter a
/// global mean. Returns 0.0 when no such pair exists (including the
/// all-identical-embeddings case, where every distance is zero).
pub fn sibling_distinctiveness(tree: &Tree) -> f64 {
    let mut distances: Vec<f64> = Vec::new();

    for node in tree.nodes.values() {
        if node.is_leaf || node.child_ids.len() < 2 {
            continue;
        }

        let child_embs: Vec<Vec<f32>> = node
            .child_ids
            .iter()
            .filter_map(|child_id| {
                let child = tree.get(child_id)?;
                let emb = child.summary_embedding.as_ref()?;
                if vecmath::l2_norm(emb) > 0.0 {
                    Some(vecmath::l2_normalized(emb))
                } else {
                    None
                }
            })
            .collect();

        if child_embs.len() < 2 {
            continue;
        }

        for i in 0..child_embs.len() {
            for j in (i + 1)..child_embs.len() {
                let cos_sim = vecmath::dot(&child_embs[i], &child_embs[j]) as f64;
                distances.push(1.0 - cos_sim);
            }
        }
    }

    if distances.is_empty() {
        return 0.0;
    }
    distances.iter().sum::<f64>() / distances.len() as f64
}
