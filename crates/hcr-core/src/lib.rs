//! Core data model for hierarchical context retrieval.
//!
//! This crate holds the types shared by the whole `hcr-*` stack:
//!
//! - **Corpus**: [`Chunk`], the atomic indexed unit, immutable after
//!   validated construction.
//! - **Queries**: [`Query`] with category and difficulty tags for
//!   stratified evaluation.
//! - **Tree**: [`Tree`] / [`TreeNode`], an arena of identifier-linked
//!   nodes, one tagged variant for internal and leaf nodes, plus the
//!   [`RoutingSummary`] attached to every internal node.
//! - **Providers**: trait seams for the external embedding, cross-encoder,
//!   and completion models ([`provider`]).
//! - **Stores**: persisted embedding and cross-encoder-score caches that
//!   let evaluation replay model outputs offline ([`store`]).
//!
//! # Ownership
//!
//! The corpus and the tree are built once and then shared read-only by every
//! index and traversal component; per-query state never mutates them. The
//! cross-encoder score cache ([`store::CeScoreCache`]) is the single
//! mutable evaluation-time resource and uses atomic per-key inserts.

/// Corpus data model.
pub mod chunk;

/// Error types shared across the hcr crates.
pub mod error;

/// Provider interfaces for external models.
pub mod provider;

/// Query data model.
pub mod query;

/// Persisted embedding and score caches.
pub mod store;

/// Routing summaries.
pub mod summary;

/// The summary tree arena.
pub mod tree;

/// Vector math helpers.
pub mod vecmath;

pub use chunk::Chunk;
pub use error::HcrError;
pub use query::{Difficulty, Query, QueryCategory};
pub use summary::RoutingSummary;
pub use tree::{Tree, TreeNode};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::chunk::Chunk;
    pub use crate::error::HcrError;
    pub use crate::provider::{CompletionModel, CrossEncoderModel, TextEmbedder};
    pub use crate::query::{Difficulty, Query, QueryCategory};
    pub use crate::store::{CeScoreCache, EmbeddingStore, StoredEmbedder};
    pub use crate::summary::RoutingSummary;
    pub use crate::tree::{Tree, TreeNode};
}
