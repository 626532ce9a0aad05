//! The summary tree: an arena of nodes indexed by string identifier.
//!
//! Child and parent references are identifiers, not ownership pointers, so
//! deep trees are cheap and cycles are impossible by construction. Internal
//! and leaf nodes share one tagged variant (`is_leaf` + conditionally
//! populated fields); invariants are enforced at construction time.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{HcrError, RoutingSummary};

/// A node in the summary tree.
///
/// Leaf nodes point at exactly one chunk; internal nodes carry a routing
/// summary and its embedding once the build completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Unique node identifier.
    pub id: String,
    /// Depth level, 0 at the root, strictly increasing toward leaves.
    pub level: u32,
    /// Parent identifiers. Empty for the root; exactly one entry otherwise.
    pub parent_ids: Vec<String>,
    /// Child identifiers. Empty for leaves.
    pub child_ids: Vec<String>,
    /// Leaf flag.
    pub is_leaf: bool,
    /// Routing summary. Present on every internal node of a built tree.
    #[serde(default)]
    pub summary: Option<RoutingSummary>,
    /// L2-normalized embedding of the summary text.
    #[serde(default)]
    pub summary_embedding: Option<Vec<f32>>,
    /// Associated chunk. Present on every leaf.
    #[serde(default)]
    pub chunk_id: Option<String>,
}

impl TreeNode {
    /// Create a leaf node for one chunk.
    pub fn leaf(
        id: impl Into<String>,
        level: u32,
        parent_ids: Vec<String>,
        chunk_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            parent_ids,
            child_ids: Vec::new(),
            is_leaf: true,
            summary: None,
            summary_embedding: None,
            chunk_id: Some(chunk_id.into()),
        }
    }

    /// Create an internal node with a routing summary.
    pub fn branch(
        id: impl Into<String>,
        level: u32,
        parent_ids: Vec<String>,
        child_ids: Vec<String>,
        summary: RoutingSummary,
        summary_embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            parent_ids,
            child_ids,
            is_leaf: false,
            summary: Some(summary),
            summary_embedding: Some(summary_embedding),
            chunk_id: None,
        }
    }

    /// Check per-node invariants.
    pub fn validate(&self) -> Result<(), HcrError> {
        if self.is_leaf {
            if self.chunk_id.is_none() {
                return Err(HcrError::InvalidTree(format!(
                    "leaf node '{}' has no chunk_id",
                    self.id
                )));
            }
            if !self.child_ids.is_empty() {
                return Err(HcrError::InvalidTree(format!(
                    "leaf node '{}' has children",
                    self.id
                )));
            }
        } else if self.child_ids.is_empty() {
            return Err(HcrError::InvalidTree(format!(
                "internal node '{}' has no children",
                self.id
            )));
        }
        Ok(())
    }
}

/// The complete summary tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Identifier of the root node.
    pub root_id: String,
    /// Arena of nodes keyed by identifier.
    pub nodes: HashMap<String, TreeNode>,
    /// Maximum observed level.
    pub depth: u32,
}

impl Tree {
    /// Create a validated tree.
    ///
    /// # Errors
    ///
    /// Returns `HcrError::InvalidTree` if the root is missing, any node
    /// fails its invariants, or any child/parent edge dangles.
    pub fn new(
        root_id: impl Into<String>,
        nodes: HashMap<String, TreeNode>,
        depth: u32,
    ) -> Result<Self, HcrError> {
        let tree = Self {
            root_id: root_id.into(),
            nodes,
            depth,
        };
        tree.validate()?;
        Ok(tree)
    }

    /// Validate structural invariants over the whole arena.
    pub fn validate(&self) -> Result<(), HcrError> {
        let root = self.nodes.get(&self.root_id).ok_or_else(|| {
            HcrError::InvalidTree(format!("root_id '{}' not found in nodes", self.root_id))
        })?;
        if !root.parent_ids.is_empty() {
            return Err(HcrError::InvalidTree(format!(
                "root node '{}' has parents",
                root.id
            )));
        }
        for node in self.nodes.values() {
            node.validate()?;
            for child_id in &node.child_ids {
                let child = self.nodes.get(child_id).ok_or_else(|| {
                    HcrError::InvalidTree(format!(
                        "node '{}' references missing child '{}'",
                        node.id, child_id
                    ))
                })?;
                if !child.parent_ids.contains(&node.id) {
                    return Err(HcrError::InvalidTree(format!(
                        "child '{}' does not list '{}' as parent",
                        child_id, node.id
                    )));
                }
                if child.level <= node.level {
                    return Err(HcrError::InvalidTree(format!(
                        "child '{}' level {} does not exceed parent '{}' level {}",
                        child_id, child.level, node.id, node.level
                    )));
                }
            }
            for parent_id in &node.parent_ids {
                if !self.nodes.contains_key(parent_id) {
                    return Err(HcrError::InvalidTree(format!(
                        "node '{}' references missing parent '{}'",
                        node.id, parent_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up a node by identifier.
    pub fn get(&self, node_id: &str) -> Option<&TreeNode> {
        self.nodes.get(node_id)
    }

    /// The root node.
    pub fn root(&self) -> &TreeNode {
        // Root presence is a construction invariant.
        &self.nodes[&self.root_id]
    }

    /// All leaf descendants of a node, depth-first in child order.
    ///
    /// A leaf input returns itself. An unknown identifier returns an empty
    /// list (degraded, never an error).
    pub fn descendant_leaves(&self, node_id: &str) -> Vec<String> {
        let mut leaves = Vec::new();
        self.collect_leaves(node_id, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, node_id: &str, out: &mut Vec<String>) {
        let Some(node) = self.nodes.get(node_id) else {
            return;
        };
        if node.is_leaf {
            out.push(node.id.clone());
            return;
        }
        for child_id in &node.child_ids {
            self.collect_leaves(child_id, out);
        }
    }

    /// Find the leaf node holding a given chunk.
    pub fn leaf_for_chunk(&self, chunk_id: &str) -> Option<&TreeNode> {
        self.nodes
            .values()
            .find(|n| n.is_leaf && n.chunk_id.as_deref() == Some(chunk_id))
    }

    /// Walk up from a chunk's leaf to its ancestor at `target_level`.
    ///
    /// Returns `None` if the chunk is unknown, the walk runs out of parents,
    /// or the leaf sits above the target level.
    pub fn ancestor_at_level(&self, chunk_id: &str, target_level: u32) -> Option<String> {
        let mut current = self.leaf_for_chunk(chunk_id)?;
        while current.level > target_level {
            let parent_id = current.parent_ids.first()?;
            current = self.nodes.get(parent_id)?;
        }
        if current.level == target_level {
            Some(current.id.clone())
        } else {
            None
        }
    }

    /// Serialize the tree to a single JSON document.
    pub fn save(&self, path: &Path) -> Result<(), HcrError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a tree from a JSON document.
    pub fn load(path: &Path) -> Result<Self, HcrError> {
        if !path.exists() {
            return Err(HcrError::MissingArtifact(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        let tree: Tree = serde_json::from_str(&json)?;
        tree.validate()?;
        Ok(tree)
    }
}
