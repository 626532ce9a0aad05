//! Routing summaries: structured descriptions attached to internal tree nodes.

use serde::{Deserialize, Serialize};

use crate::HcrError;

/// Structured routing summary for an internal tree node.
///
/// The summary tells the traversal whether a query belongs in this subtree
/// (`includes`) or in a sibling subtree (`excludes`). List order is
/// preserved but carries no ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingSummary {
    /// Short topical theme. Never empty on a built tree.
    pub theme: String,
    /// Specific topics this subtree covers.
    pub includes: Vec<String>,
    /// Topics covered by sibling subtrees instead (contrastive).
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Proper nouns and named entities from the content.
    #[serde(default)]
    pub key_entities: Vec<String>,
    /// Searchable keywords a user would type.
    #[serde(default)]
    pub key_terms: Vec<String>,
    /// Representative excerpt from the cluster content.
    #[serde(default)]
    pub content_snippet: String,
}

impl RoutingSummary {
    /// Check that the theme is non-empty.
    pub fn validate(&self) -> Result<(), HcrError> {
        if self.theme.trim().is_empty() {
            return Err(HcrError::InvalidTree(
                "routing summary theme must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Canonical text rendering used to embed the summary.
    ///
    /// Sections appear in a fixed order (theme, Covers, Not, Entities,
    /// Terms, Sample) joined by `. `; empty sections are omitted so the
    /// embedding only sees real signal.
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.theme.clone()];
        if !self.includes.is_empty() {
            parts.push(format!("Covers: {}", self.includes.join(", ")));
        }
        if !self.excludes.is_empty() {
            parts.push(format!("Not: {}", self.excludes.join(", ")));
        }
        if !self.key_entities.is_empty() {
            parts.push(format!("Entities: {}", self.key_entities.join(", ")));
        }
        if !self.key_terms.is_empty() {
            parts.push(format!("Terms: {}", self.key_terms.join(", ")));
        }
        if !self.content_snippet.is_empty() {
            parts.push(format!("Sample: {}", self.content_snippet));
        }
        parts.join(". ")
    }
}
