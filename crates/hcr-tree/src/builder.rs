//! Tree builder: hierarchical clustering + routing summaries -> `Tree`.
//!
//! The builder walks the cluster hierarchy bottom-up. Children are
//! materialized before their parent so the parent's summary prompt can cite
//! the already-built child summaries as sibling context. The corpus is
//! borrowed read-only; the produced tree owns its nodes exclusively.

use std::collections::HashMap;

use hcr_core::provider::{CompletionModel, TextEmbedder};
use hcr_core::{vecmath, Chunk, HcrError, RoutingSummary, Tree, TreeNode};
use tracing::info;

use crate::clustering::{hierarchical_kmeans, ClusterNode};
use crate::summarizer::generate_routing_summary;

/// Snippet cap (characters) for the representative content excerpt.
const SNIPPET_MAX_CHARS: usize = 200;

/// Builds a summary tree from chunks via hierarchical clustering and LLM
/// routing summaries.
pub struct TreeBuilder<'a> {
    embedder: &'a dyn TextEmbedder,
    llm: &'a dyn CompletionModel,
    depth: usize,
    branching: usize,
    node_counter: u32,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder with the default layout (depth 2, branching 10).
    pub fn new(embedder: &'a dyn TextEmbedder, llm: &'a dyn CompletionModel) -> Self {
        Self {
            embedder,
            llm,
            depth: 2,
            branching: 10,
            node_counter: 0,
        }
    }

    /// Override tree depth and branching factor.
    pub fn with_layout(mut self, depth: usize, branching: usize) -> Self {
        self.depth = depth;
        self.branching = branching;
        self
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, self.node_counter);
        self.node_counter += 1;
        id
    }

    /// Build a tree from chunks and their embeddings.
    ///
    /// 1. Cluster chunk embeddings hierarchically (seeded k-means).
    /// 2. Materialize tree nodes bottom-up, generating a routing summary for
    ///    every internal node with sibling context.
    /// 3. Embed each summary's canonical text for traversal scoring.
    ///
    /// # Errors
    ///
    /// Clustering rejects empty corpora and id/embedding mismatches; the
    /// embedder may fail; summary generation never fails (fallback).
    pub fn build(
        &mut self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<Tree, HcrError> {
        self.node_counter = 0;
        let chunk_map: HashMap<&str, &Chunk> =
            chunks.iter().map(|c| (c.id.as_str(), c)).collect();
        let chunk_ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();

        let cluster_root =
            hierarchical_kmeans(embeddings, &chunk_ids, self.branching, self.depth)?;

        let mut nodes: HashMap<String, TreeNode> = HashMap::new();
        let root_id = self.build_subtree(&cluster_root, &chunk_map, &mut nodes, 0)?;

        let max_level = nodes.values().map(|n| n.level).max().unwrap_or(0);
        Tree::new(root_id, nodes, max_level)
    }

    /// Recursively materialize a cluster subtree; returns the subtree root id.
    fn build_subtree(
        &mut self,
        cluster: &ClusterNode,
        chunk_map: &HashMap<&str, &Chunk>,
        nodes: &mut HashMap<String, TreeNode>,
        level: u32,
    ) -> Result<String, HcrError> {
        if cluster.is_leaf_cluster() {
            if cluster.chunk_ids.len() == 1 {
                // Single chunk: a leaf node directly
                let leaf_id = self.next_id("leaf");
                nodes.insert(
                    leaf_id.clone(),
                    TreeNode::leaf(&leaf_id, level, vec![], &cluster.chunk_ids[0]),
                );
                return Ok(leaf_id);
            }

            // Multiple chunks in a leaf cluster: a branch of per-chunk leaves
            let branch_id = self.next_id("branch");
            let mut child_ids = Vec::with_capacity(cluster.chunk_ids.len());
            for chunk_id in &cluster.chunk_ids {
                let leaf_id = self.next_id("leaf");
                nodes.insert(
                    leaf_id.clone(),
                    TreeNode::leaf(&leaf_id, level + 1, vec![branch_id.clone()], chunk_id),
                );
                child_ids.push(leaf_id);
            }

            let (summary, embedding) = self.summarize(cluster, chunk_map, &[])?;
            nodes.insert(
                branch_id.clone(),
                TreeNode::branch(&branch_id, level, vec![], child_ids, summary, embedding),
            );
            return Ok(branch_id);
        }

        // Internal cluster: children first, collecting sibling summaries for
        // contrastive phrasing
        let branch_id = self.next_id("branch");
        let mut child_ids = Vec::with_capacity(cluster.children.len());
        let mut sibling_summaries: Vec<RoutingSummary> = Vec::new();

        for child_cluster in &cluster.children {
            let child_id = self.build_subtree(child_cluster, chunk_map, nodes, level + 1)?;
            let child = nodes
                .get_mut(&child_id)
                .expect("child node was just inserted");
            child.parent_ids.push(branch_id.clone());
            if let Some(summary) = &child.summary {
                sibling_summaries.push(summary.clone());
            }
            child_ids.push(child_id);
        }

        let (summary, embedding) = self.summarize(cluster, chunk_map, &sibling_summaries)?;
        info!(
            node = %branch_id,
            level,
            children = child_ids.len(),
            chunks = cluster.chunk_ids.len(),
            "built internal node"
        );
        nodes.insert(
            branch_id.clone(),
            TreeNode::branch(&branch_id, level, vec![], child_ids, summary, embedding),
        );
        Ok(branch_id)
    }

    /// Generate and embed the routing summary for a cluster.
    fn summarize(
        &self,
        cluster: &ClusterNode,
        chunk_map: &HashMap<&str, &Chunk>,
        sibling_summaries: &[RoutingSummary],
    ) -> Result<(RoutingSummary, Vec<f32>), HcrError> {
        let cluster_texts: Vec<String> = cluster
            .chunk_ids
            .iter()
            .filter_map(|id| chunk_map.get(id.as_str()))
            .map(|c| c.content.clone())
            .collect();

        let mut summary = generate_routing_summary(self.llm, &cluster_texts, sibling_summaries);
        summary.content_snippet = extract_snippet(&cluster_texts);

        let embedding = self.embedder.embed_text(&summary.embedding_text())?;
        Ok((summary, vecmath::l2_normalized(&embedding)))
    }
}

/// Representative content snippet: the first chunk's text, cut at the last
/// space before the 200-character limit so the embedding sees real content
/// terms without a mid-word tail.
fn extract_snippet(cluster_texts: &[String]) -> String {
    let Some(first) = cluster_texts.first() else {
        return String::new();
    };
    let text = first.trim();
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
    match head.rfind(' ') {
        Some(cut) if cut > 0 => head[..cut].to_string(),
        _ => head,
    }
}
