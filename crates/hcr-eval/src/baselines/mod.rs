//! Retrieval baselines under one interface.
//!
//! Every system exposes the same two operations: `rank` produces the full
//! scored ranking for IR metrics, `retrieve` packs the ranking into a hard
//! token budget. Comparing HCR against BM25, hybrid RRF, and the flat
//! cross-encoder (the kill baseline) is the entire point of the harness.

use std::collections::HashMap;

use hcr_core::{Chunk, HcrError};

/// BM25 keyword baseline.
pub mod bm25;

/// Flat cross-encoder baseline (the kill baseline).
pub mod flat_ce;

/// Tree-based dual-path baseline (the system under test).
pub mod hcr;

/// Hybrid RRF baseline.
pub mod hybrid;

pub use bm25::Bm25Baseline;
pub use flat_ce::FlatCeBaseline;
pub use hcr::HcrBaseline;
pub use hybrid::HybridBaseline;

/// Ranking depth used by `retrieve` before packing.
pub const DEFAULT_RANK_K: usize = 50;

/// A retrieval system under evaluation.
pub trait RetrievalBaseline {
    /// System name for reporting.
    fn name(&self) -> &str;

    /// Full scored ranking, `(chunk_id, score)` descending, at most `top_k`
    /// unique entries.
    fn rank(&self, query: &str, top_k: usize) -> Result<Vec<(String, f32)>, HcrError>;

    /// Rank, then greedily pack into `token_budget`.
    fn retrieve(&self, query: &str, token_budget: u32) -> Result<Vec<Chunk>, HcrError>;
}

/// Pack ranked chunks greedily in rank order until the budget is exhausted.
///
/// Chunks that would exceed the budget are skipped, not terminal; unknown
/// identifiers are ignored.
pub fn greedy_token_pack(
    chunks: &[Chunk],
    ranked: &[(String, f32)],
    token_budget: u32,
) -> Vec<Chunk> {
    let chunk_map: HashMap<&str, &Chunk> = chunks.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut packed: Vec<Chunk> = Vec::new();
    let mut tokens_used: u32 = 0;

    for (chunk_id, _) in ranked {
        let Some(chunk) = chunk_map.get(chunk_id.as_str()) else {
            continue;
        };
        if tokens_used + chunk.token_count > token_budget {
            continue;
        }
        packed.push((*chunk).clone());
        tokens_used += chunk.token_count;
    }

    packed
}
