//! Shared test fixtures for the evaluation crate.

use std::collections::HashMap;

use hcr_core::provider::{CrossEncoderModel, TextEmbedder};
use hcr_core::{Chunk, HcrError, RoutingSummary, Tree, TreeNode};

/// Embedder backed by an exact text -> vector map; unknown texts embed as
/// zero vectors.
pub struct MapEmbedder {
    map: HashMap<String, Vec<f32>>,
    dim: usize,
}

impl MapEmbedder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        let dim = entries.first().map_or(0, |(_, v)| v.len());
        Self {
            map: entries
                .iter()
                .map(|(text, vec)| (text.to_string(), vec.clone()))
                .collect(),
            dim,
        }
    }
}

impl TextEmbedder for MapEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HcrError> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, HcrError> {
        Ok(self
            .map
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dim]))
    }
}

/// Cross-encoder stub scoring by query-term containment in the text.
pub struct KeywordModel;

impl CrossEncoderModel for KeywordModel {
    fn predict(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, HcrError> {
        Ok(pairs
            .iter()
            .map(|(query, text)| {
                query
                    .split_whitespace()
                    .filter(|term| text.contains(term))
                    .count() as f32
            })
            .collect())
    }
}

fn summary(theme: &str) -> RoutingSummary {
    RoutingSummary {
        theme: theme.to_string(),
        includes: vec![theme.to_string()],
        ..Default::default()
    }
}

/// root -> {branch-a, branch-b}; each branch -> two chunk leaves.
/// branch-a embeds along the x axis, branch-b along the y axis.
pub fn two_branch_tree() -> Tree {
    let mut nodes = HashMap::new();
    nodes.insert(
        "root".to_string(),
        TreeNode::branch(
            "root",
            0,
            vec![],
            vec!["branch-a".to_string(), "branch-b".to_string()],
            summary("everything"),
            vec![0.707, 0.707],
        ),
    );
    nodes.insert(
        "branch-a".to_string(),
        TreeNode::branch(
            "branch-a",
            1,
            vec!["root".to_string()],
            vec!["leaf-a1".to_string(), "leaf-a2".to_string()],
            summary("apples"),
            vec![1.0, 0.0],
        ),
    );
    nodes.insert(
        "branch-b".to_string(),
        TreeNode::branch(
            "branch-b",
            1,
            vec!["root".to_string()],
            vec!["leaf-b1".to_string(), "leaf-b2".to_string()],
            summary("bridges"),
            vec![0.0, 1.0],
        ),
    );
    for (leaf, parent, chunk) in [
        ("leaf-a1", "branch-a", "c-a1"),
        ("leaf-a2", "branch-a", "c-a2"),
        ("leaf-b1", "branch-b", "c-b1"),
        ("leaf-b2", "branch-b", "c-b2"),
    ] {
        nodes.insert(
            leaf.to_string(),
            TreeNode::leaf(leaf, 2, vec![parent.to_string()], chunk),
        );
    }
    Tree::new("root", nodes, 2).unwrap()
}

/// A root whose internal children carry the given summary embeddings; each
/// child holds a single chunk leaf.
pub fn tree_with_sibling_embeddings(embeddings: Vec<Vec<f32>>) -> Tree {
    let mut nodes = HashMap::new();
    let child_ids: Vec<String> = (0..embeddings.len())
        .map(|i| format!("branch-{i}"))
        .collect();
    nodes.insert(
        "root".to_string(),
        TreeNode::branch(
            "root",
            0,
            vec![],
            child_ids.clone(),
            summary("everything"),
            vec![1.0, 0.0, 0.0],
        ),
    );
    for (i, (child_id, emb)) in child_ids.iter().zip(embeddings).enumerate() {
        let leaf_id = format!("leaf-{i}");
        nodes.insert(
            child_id.clone(),
            TreeNode::branch(
                child_id,
                1,
                vec!["root".to_string()],
                vec![leaf_id.clone()],
                summary(&format!("branch {i}")),
                emb,
            ),
        );
        nodes.insert(
            leaf_id.clone(),
            TreeNode::leaf(&leaf_id, 2, vec![child_id.clone()], format!("c-{i}")),
        );
    }
    Tree::new("root", nodes, 2).unwrap()
}

/// Chunks matching the `two_branch_tree` leaves.
pub fn two_branch_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("c-a1", "doc-a", "red apples in the orchard", 5).unwrap(),
        Chunk::new("c-a2", "doc-a", "apple cider pressing", 3).unwrap(),
        Chunk::new("c-b1", "doc-b", "suspension bridges over rivers", 4).unwrap(),
        Chunk::new("c-b2", "doc-b", "bridge tower maintenance", 3).unwrap(),
    ]
}

/// Embeddings aligned with `two_branch_chunks`.
pub fn two_branch_embeddings() -> Vec<Vec<f32>> {
    vec![
        vec![1.0, 0.0],
        vec![0.9, 0.1],
        vec![0.0, 1.0],
        vec![0.1, 0.9],
    ]
}
