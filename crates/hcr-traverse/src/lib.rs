//! Query-time traversal for the hcr stack.
//!
//! Everything that happens between a query and a packed context window:
//!
//! - **Scorer** ([`scorer`]): cached cross-encoder scoring shared across
//!   queries and retrieval systems.
//! - **Cascade** ([`cascade`]): per-level dense pre-filter + leaf-gated
//!   cross-encoder rerank.
//! - **Beam** ([`beam`]): level-synchronous beam search with path-score
//!   smoothing and MMR-style diversity.
//! - **Collapsed** ([`collapsed`]): flat search over all summary nodes.
//! - **Dual path** ([`dual_path`]): runs both, returns the higher
//!   top-result confidence.
//! - **Selection** ([`selection`]): greedy token packing under a hard
//!   budget with an optional redundancy penalty.
//!
//! All components borrow the tree and indexes immutably; per-query state is
//! ephemeral. The only shared mutable state is the cross-encoder score
//! cache behind [`scorer::CrossEncoderScorer`].

/// Beam search traversal.
pub mod beam;

/// Per-level scoring cascade.
pub mod cascade;

/// Collapsed-tree retrieval.
pub mod collapsed;

/// Dual-path arbitration.
pub mod dual_path;

/// Path-relevance smoothing.
pub mod path_score;

/// Cached cross-encoder scoring.
pub mod scorer;

/// Greedy token packing.
pub mod selection;

pub use beam::{BeamEntry, BeamSearch, BeamSearchResult};
pub use cascade::ScoringCascade;
pub use collapsed::{CollapsedResult, CollapsedRetrieval};
pub use dual_path::{DualPath, DualPathResult, Strategy};
pub use path_score::path_relevance_ema;
pub use scorer::CrossEncoderScorer;
pub use selection::greedy_token_packing;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::beam::{BeamSearch, BeamSearchResult};
    pub use crate::cascade::ScoringCascade;
    pub use crate::collapsed::{CollapsedResult, CollapsedRetrieval};
    pub use crate::dual_path::{DualPath, DualPathResult, Strategy};
    pub use crate::scorer::CrossEncoderScorer;
    pub use crate::selection::greedy_token_packing;
}
