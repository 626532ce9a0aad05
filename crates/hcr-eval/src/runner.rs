//! Benchmark runner: evaluates retrieval systems over a query suite.
//!
//! IR metrics (nDCG@10, Recall@10, MRR) are computed on the **full ranked
//! list** from `rank`, not on the token-packed result; token efficiency
//! (mean tokens used) is computed on the packed result from `retrieve`. The
//! two answer different questions and conflating them hides packing losses.

use std::collections::HashSet;
use std::path::Path;

use hcr_core::{HcrError, Query};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baselines::{HcrBaseline, RetrievalBaseline, DEFAULT_RANK_K};
use crate::epsilon::EpsilonMeasurement;
use crate::ir_metrics::{mrr, ndcg_at_k, recall_at_k};
use crate::tree_quality::SIBLING_DISTINCTIVENESS_KILL;

/// Evaluation ranking cutoff for nDCG/Recall.
pub const EVAL_TOP_K: usize = 10;

/// Default token budget for packing metrics.
pub const DEFAULT_TOKEN_BUDGET: u32 = 400;

/// Kill threshold for level-1 epsilon.
pub const EPSILON_L1_KILL: f64 = 0.5;

/// Aggregate benchmark results for one retrieval system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// System name.
    pub system_name: String,
    /// Corpus size (chunks).
    pub corpus_size: usize,
    /// Number of queries evaluated.
    pub query_count: usize,
    /// Per-level routing accuracy (HCR only; empty for flat systems).
    #[serde(default)]
    pub epsilon_per_level: Vec<EpsilonMeasurement>,
    /// Fraction of queries judged sufficient at the 400-token budget.
    pub sufficiency_at_400: f64,
    /// Mean nDCG@10 over the full rankings.
    pub ndcg_at_10: f64,
    /// Mean Recall@10 over the full rankings.
    pub recall_at_10: f64,
    /// Mean reciprocal rank over the full rankings.
    pub mrr: f64,
    /// Mean packed tokens at the default budget.
    pub mean_tokens_used: f64,
}

/// Per-query diagnostics for the system under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerQueryRecord {
    pub query_id: String,
    pub query_text: String,
    pub category: hcr_core::QueryCategory,
    pub difficulty: hcr_core::Difficulty,
    pub ndcg_at_10: f64,
    pub recall_at_10: f64,
    pub mrr: f64,
    pub tokens_used: u32,
    pub chunks_ranked: usize,
}

/// Fail-fast verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailFastStatus {
    Passed,
    Killed,
}

/// Single outcome record for fail-fast mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailFastOutcome {
    /// PASSED or KILLED.
    pub status: FailFastStatus,
    /// Metric that triggered the kill, when killed.
    pub metric: Option<String>,
    /// Observed value of the triggering metric.
    pub value: Option<f64>,
    /// Threshold the value violated.
    pub threshold: Option<f64>,
}

impl FailFastOutcome {
    fn passed() -> Self {
        Self {
            status: FailFastStatus::Passed,
            metric: None,
            value: None,
            threshold: None,
        }
    }

    fn killed(metric: &str, value: f64, threshold: f64) -> Self {
        Self {
            status: FailFastStatus::Killed,
            metric: Some(metric.to_string()),
            value: Some(value),
            threshold: Some(threshold),
        }
    }
}

/// Apply the fail-fast gates in order: tree quality, level-1 routing, nDCG
/// delta against the kill baseline.
pub fn fail_fast_check(
    sibling_distinctiveness: f64,
    l1_epsilon: Option<f64>,
    ndcg_delta: Option<f64>,
) -> FailFastOutcome {
    if sibling_distinctiveness < SIBLING_DISTINCTIVENESS_KILL {
        return FailFastOutcome::killed(
            "sibling_distinctiveness",
            sibling_distinctiveness,
            SIBLING_DISTINCTIVENESS_KILL,
        );
    }
    if let Some(eps) = l1_epsilon {
        if eps > EPSILON_L1_KILL {
            return FailFastOutcome::killed("epsilon_l1", eps, EPSILON_L1_KILL);
        }
    }
    if let Some(delta) = ndcg_delta {
        if delta < 0.0 {
            return FailFastOutcome::killed("ndcg_delta", delta, 0.0);
        }
    }
    FailFastOutcome::passed()
}

/// Evaluate one baseline across a query suite.
pub fn evaluate_baseline(
    baseline: &dyn RetrievalBaseline,
    queries: &[Query],
    corpus_size: usize,
    token_budget: u32,
) -> Result<BenchmarkResult, HcrError> {
    let mut all_ranked: Vec<Vec<String>> = Vec::with_capacity(queries.len());
    let mut total_tokens = 0.0f64;

    for query in queries {
        let ranked = baseline.rank(&query.text, DEFAULT_RANK_K)?;
        all_ranked.push(ranked.into_iter().map(|(id, _)| id).collect());

        let packed = baseline.retrieve(&query.text, token_budget)?;
        total_tokens += packed.iter().map(|c| c.token_count as f64).sum::<f64>();
    }

    Ok(aggregate(
        baseline.name(),
        queries,
        &all_ranked,
        total_tokens,
        corpus_size,
    ))
}

/// Evaluate the HCR baseline, recording per-query beams for epsilon.
pub fn evaluate_hcr(
    baseline: &HcrBaseline<'_>,
    queries: &[Query],
    corpus_size: usize,
    token_budget: u32,
) -> Result<BenchmarkResult, HcrError> {
    let mut all_ranked: Vec<Vec<String>> = Vec::with_capacity(queries.len());
    let mut total_tokens = 0.0f64;

    for query in queries {
        let ranked = baseline.rank(&query.text, DEFAULT_RANK_K)?;
        baseline.store_beam_record(&query.id);
        all_ranked.push(ranked.into_iter().map(|(id, _)| id).collect());

        let packed = baseline.retrieve(&query.text, token_budget)?;
        total_tokens += packed.iter().map(|c| c.token_count as f64).sum::<f64>();
    }

    Ok(aggregate(
        baseline.name(),
        queries,
        &all_ranked,
        total_tokens,
        corpus_size,
    ))
}

fn aggregate(
    name: &str,
    queries: &[Query],
    all_ranked: &[Vec<String>],
    total_tokens: f64,
    corpus_size: usize,
) -> BenchmarkResult {
    let n = queries.len();
    let mut ndcg_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut mrr_sum = 0.0;

    for (query, ranked) in queries.iter().zip(all_ranked) {
        let relevant: HashSet<String> = query.gold_chunk_ids.iter().cloned().collect();
        ndcg_sum += ndcg_at_k(ranked, &relevant, EVAL_TOP_K);
        recall_sum += recall_at_k(ranked, &relevant, EVAL_TOP_K);
        mrr_sum += mrr(ranked, &relevant);
    }

    let divisor = if n > 0 { n as f64 } else { 1.0 };
    let result = BenchmarkResult {
        system_name: name.to_string(),
        corpus_size,
        query_count: n,
        epsilon_per_level: Vec::new(),
        sufficiency_at_400: 0.0,
        ndcg_at_10: ndcg_sum / divisor,
        recall_at_10: recall_sum / divisor,
        mrr: mrr_sum / divisor,
        mean_tokens_used: total_tokens / divisor,
    };
    info!(
        system = name,
        ndcg = result.ndcg_at_10,
        recall = result.recall_at_10,
        mrr = result.mrr,
        mean_tokens = result.mean_tokens_used,
        "evaluated baseline"
    );
    result
}

/// Per-query diagnostics for one baseline.
pub fn per_query_records(
    baseline: &dyn RetrievalBaseline,
    queries: &[Query],
    token_budget: u32,
) -> Result<Vec<PerQueryRecord>, HcrError> {
    let mut records = Vec::with_capacity(queries.len());

    for query in queries {
        let ranked = baseline.rank(&query.text, DEFAULT_RANK_K)?;
        let ranked_ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
        let relevant: HashSet<String> = query.gold_chunk_ids.iter().cloned().collect();
        let packed = baseline.retrieve(&query.text, token_budget)?;

        records.push(PerQueryRecord {
            query_id: query.id.clone(),
            query_text: query.text.clone(),
            category: query.category,
            difficulty: query.difficulty,
            ndcg_at_10: ndcg_at_k(&ranked_ids, &relevant, EVAL_TOP_K),
            recall_at_10: recall_at_k(&ranked_ids, &relevant, EVAL_TOP_K),
            mrr: mrr(&ranked_ids, &relevant),
            tokens_used: packed.iter().map(|c| c.token_count).sum(),
            chunks_ranked: ranked_ids.len(),
        });
    }

    Ok(records)
}

/// Save results as a JSON array.
pub fn save_results(results: &[BenchmarkResult], path: &Path) -> Result<(), HcrError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(results)?)?;
    Ok(())
}

/// Load previously saved results; an absent file is an empty list.
pub fn load_results(path: &Path) -> Result<Vec<BenchmarkResult>, HcrError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

/// Fixed-width comparison table over all evaluated systems.
pub fn format_comparison_table(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(70));
    out.push('\n');
    out.push_str(&format!(
        "{:<15} {:>10} {:>10} {:>10} {:>10}\n",
        "System", "nDCG@10", "Recall@10", "MRR", "MeanTok"
    ));
    out.push_str(&"-".repeat(70));
    out.push('\n');
    for r in results {
        out.push_str(&format!(
            "{:<15} {:>10.4} {:>10.4} {:>10.4} {:>10.0}\n",
            r.system_name, r.ndcg_at_10, r.recall_at_10, r.mrr, r.mean_tokens_used
        ));
    }
    out.push_str(&"=".repeat(70));
    out
}
