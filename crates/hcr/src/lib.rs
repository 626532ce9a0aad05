//! # hcr
//!
//! The unified entry point for the `hcr-*` hierarchical context retrieval
//! stack.
//!
//! Given a natural-language query and a corpus of text chunks, the engine
//! selects a small set of chunks (bounded by a hard token budget) that best
//! supports answering the query. The corpus is organized into a summary
//! tree; queries route through it via beam search, while a parallel flat
//! search guards against routing failures.
//!
//! # Architecture
//!
//! The stack is composed of five crates:
//!
//! 1. **Core** (`hcr-core`): chunks, queries, the summary tree, provider
//!    interfaces, persisted caches.
//! 2. **Retrieve** (`hcr-retrieve`): BM25, exact dense, and hybrid RRF
//!    indexes. Goal: corpus -> scored candidates.
//! 3. **Tree** (`hcr-tree`): seeded k-means clustering + LLM routing
//!    summaries. Goal: corpus -> routable summary tree.
//! 4. **Traverse** (`hcr-traverse`): cascade, beam search, collapsed
//!    retrieval, dual-path arbitration, token packing. Goal: query ->
//!    packed context.
//! 5. **Eval** (`hcr-eval`): IR metrics, routing accuracy, tree quality,
//!    baselines, fail-fast gates. Goal: quantify whether the tree earns
//!    its keep.
//!
//! The `hcr` binary drives the benchmark harness over prepared corpora.

/// Re-exports of the core data model.
pub mod core {
    pub use hcr_core::*;
}

/// Re-exports of first-stage retrieval.
pub mod retrieve {
    pub use hcr_retrieve::*;
}

/// Re-exports of tree construction.
pub mod tree {
    pub use hcr_tree::*;
}

/// Re-exports of query-time traversal.
pub mod traverse {
    pub use hcr_traverse::*;
}

/// Re-exports of the evaluation harness.
pub mod eval {
    pub use hcr_eval::*;
}

pub mod prelude {
    pub use hcr_core::prelude::*;
    pub use hcr_retrieve::prelude::*;
    pub use hcr_tree::prelude::*;
    pub use hcr_traverse::prelude::*;
    pub use hcr_eval::prelude::*;
}
