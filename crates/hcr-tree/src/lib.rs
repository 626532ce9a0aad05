//! Summary-tree construction for the hcr stack.
//!
//! Two stages, both deterministic given fixed model outputs:
//!
//! 1. **Clustering** ([`clustering`]): top-down k-way k-means over chunk
//!    embeddings (seeded, best-of-`n_init`) yielding a balanced cluster
//!    hierarchy.
//! 2. **Building** ([`builder`]): materialize cluster nodes into
//!    [`hcr_core::Tree`] nodes bottom-up, attaching an LLM routing summary
//!    (with sibling context for contrastive `excludes`) and its normalized
//!    embedding to every internal node.
//!
//! Summary generation ([`summarizer`]) retries malformed completions up to
//! three times and then degrades to an observably-marked fallback summary;
//! tree construction itself never fails on LLM trouble.

/// Tree builder.
pub mod builder;

/// Hierarchical k-means clustering.
pub mod clustering;

/// LLM routing-summary generation.
pub mod summarizer;

pub use builder::TreeBuilder;
pub use clustering::{hierarchical_kmeans, ClusterNode};
pub use summarizer::{generate_routing_summary, FALLBACK_THEME};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::builder::TreeBuilder;
    pub use crate::clustering::{hierarchical_kmeans, ClusterNode};
    pub use crate::summarizer::generate_routing_summary;
}
