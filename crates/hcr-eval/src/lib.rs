//! Evaluation harness for the hcr stack.
//!
//! The whole artifact exists for comparative measurement: does routing
//! through a summary tree beat flat retrieval at equal or lower token cost?
//! This crate holds everything needed to answer that:
//!
//! - **IR metrics** ([`ir_metrics`]): nDCG@10, Recall@10, Precision@k, MRR.
//! - **Epsilon** ([`epsilon`]): per-level routing accuracy, the novel
//!   diagnostic separating tree problems from ranking problems.
//! - **Tree quality** ([`tree_quality`]): sibling distinctiveness with its
//!   kill threshold.
//! - **Baselines** ([`baselines`]): BM25, hybrid RRF, flat cross-encoder
//!   (the kill baseline), and HCR itself behind one interface.
//! - **Sufficiency** ([`sufficiency`]): LLM-as-judge evaluation of packed
//!   context, with a verdict cache.
//! - **Token efficiency** ([`token_efficiency`]): sufficiency-vs-budget
//!   curves.
//! - **Runner** ([`runner`]): orchestration, aggregate results, per-query
//!   records, fail-fast gates, comparison tables.

/// Retrieval baselines.
pub mod baselines;

/// Per-level routing accuracy.
pub mod epsilon;

/// Standard IR metrics.
pub mod ir_metrics;

/// Benchmark orchestration.
pub mod runner;

/// LLM-as-judge sufficiency.
pub mod sufficiency;

/// Query suite management.
pub mod suite;

/// Token-efficiency curves.
pub mod token_efficiency;

/// Tree quality metrics.
pub mod tree_quality;

#[cfg(test)]
pub(crate) mod testutil;

pub use baselines::{
    Bm25Baseline, FlatCeBaseline, HcrBaseline, HybridBaseline, RetrievalBaseline,
};
pub use epsilon::{compute_epsilon, EpsilonMeasurement};
pub use runner::{
    evaluate_baseline, evaluate_hcr, fail_fast_check, format_comparison_table, load_results,
    per_query_records, save_results, BenchmarkResult, FailFastOutcome, FailFastStatus,
    PerQueryRecord,
};
pub use suite::QuerySuite;
pub use sufficiency::{JudgeCache, SufficiencyJudge, SufficiencyResult};
pub use token_efficiency::{
    compute_efficiency_curve, TokenEfficiencyCurve, TokenEfficiencyPoint,
};
pub use tree_quality::{sibling_distinctiveness, SIBLING_DISTINCTIVENESS_KILL};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::baselines::{
        Bm25Baseline, FlatCeBaseline, HcrBaseline, HybridBaseline, RetrievalBaseline,
    };
    pub use crate::epsilon::{compute_epsilon, EpsilonMeasurement};
    pub use crate::ir_metrics::{mrr, ndcg_at_k, precision_at_k, recall_at_k};
    pub use crate::runner::{
        evaluate_baseline, evaluate_hcr, fail_fast_check, format_comparison_table,
        BenchmarkResult, FailFastOutcome, FailFastStatus,
    };
    pub use crate::suite::QuerySuite;
    pub use crate::sufficiency::{JudgeCache, SufficiencyJudge};
    pub use crate::tree_quality::{sibling_distinctiveness, SIBLING_DISTINCTIVENESS_KILL};
}
