//! Corpus data model: atomic indexed text units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::HcrError;

/// An atomic text unit with a token count.
///
/// Chunks are immutable after construction: every index and the summary tree
/// share the same corpus read-only for the lifetime of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier.
    pub id: String,
    /// Identifier of the owning document.
    pub document_id: String,
    /// Text content. Never empty or whitespace-only.
    pub content: String,
    /// Token count of `content`. Always positive.
    pub token_count: u32,
    /// Free-form string metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// Create a validated chunk.
    ///
    /// # Errors
    ///
    /// Returns `HcrError::InvalidChunk` for empty/whitespace content or a
    /// zero token count.
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        content: impl Into<String>,
        token_count: u32,
    ) -> Result<Self, HcrError> {
        let chunk = Self {
            id: id.into(),
            document_id: document_id.into(),
            content: content.into(),
            token_count,
            metadata: BTreeMap::new(),
        };
        chunk.validate()?;
        Ok(chunk)
    }

    /// Check construction invariants.
    ///
    /// Deserialized chunks bypass `new`; loaders call this after parsing.
    pub fn validate(&self) -> Result<(), HcrError> {
        if self.content.trim().is_empty() {
            return Err(HcrError::InvalidChunk(format!(
                "chunk '{}' has empty content",
                self.id
            )));
        }
        if self.token_count == 0 {
            return Err(HcrError::InvalidChunk(format!(
                "chunk '{}' has non-positive token count",
                self.id
            )));
        }
        Ok(())
    }
}
