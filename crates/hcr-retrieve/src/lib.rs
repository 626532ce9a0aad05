//! First-stage retrieval for the hcr stack.
//!
//! Three indexes over one shared read-only corpus:
//!
//! - **BM25** ([`Bm25Index`]): inverted index with Okapi BM25 scoring over
//!   whitespace-lowercased tokens.
//! - **Dense** ([`DenseIndex`]): exact inner-product search over
//!   L2-normalized embeddings.
//! - **Hybrid** ([`HybridIndex`]): reciprocal-rank fusion of the two.
//!
//! # Output contract
//!
//! Every `search` returns `Vec<(chunk_id, score)>` sorted by score
//! descending with a stable tiebreak, length at most `top_k`, identifiers
//! unique. An empty result is an empty vector, never an error. Indexes are
//! built once and borrowed immutably per query.

/// BM25 retrieval module.
pub mod bm25;

/// Exact dense retrieval module.
pub mod dense;

/// Hybrid RRF retrieval module.
pub mod hybrid;

pub use bm25::{Bm25Index, Bm25Params};
pub use dense::DenseIndex;
pub use hybrid::{HybridIndex, DEFAULT_RRF_K};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::bm25::{Bm25Index, Bm25Params};
    pub use crate::dense::DenseIndex;
    pub use crate::hybrid::HybridIndex;
}
