//! Standard IR metrics: nDCG, Recall, Precision, MRR.
//!
//! All metrics take the retrieved ranking (best first) and the set of
//! relevant identifiers, and return a value in `[0, 1]`. Empty inputs score
//! zero rather than erroring.

use std::collections::HashSet;

/// Normalized discounted cumulative gain at `k` (binary relevance).
pub fn ndcg_at_k(retrieved: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if relevant.is_empty() || retrieved.is_empty() {
        return 0.0;
    }

    let mut dcg = 0.0;
    for (i, doc_id) in retrieved.iter().take(k).enumerate() {
        if relevant.contains(doc_id) {
            // i+2 because log2(1) = 0
            dcg += 1.0 / ((i + 2) as f64).log2();
        }
    }

    // Ideal DCG: all relevant docs ranked first
    let mut ideal_dcg = 0.0;
    for i in 0..relevant.len().min(k) {
        ideal_dcg += 1.0 / ((i + 2) as f64).log2();
    }

    if ideal_dcg == 0.0 {
        return 0.0;
    }
    dcg / ideal_dcg
}

/// Recall at `k`: fraction of relevant docs retrieved.
pub fn recall_at_k(retrieved: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let retrieved_set: HashSet<&String> = retrieved.iter().take(k).collect();
    let hits = relevant.iter().filter(|r| retrieved_set.contains(r)).count();
    hits as f64 / relevant.len() as f64
}

/// Precision at `k`: fraction of retrieved docs that are relevant.
pub fn precision_at_k(retrieved: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    let top_k: Vec<&String> = retrieved.iter().take(k).collect();
    if top_k.is_empty() {
        return 0.0;
    }
    let hits = top_k.iter().filter(|d| relevant.contains(**d)).count();
    hits as f64 / top_k.len() as f64
}

/// Reciprocal rank of the first relevant result.
pub fn mrr(retrieved: &[String], relevant: &HashSet<String>) -> f64 {
    for (i, doc_id) in retrieved.iter().enumerate() {
        if relevant.contains(doc_id) {
            return 1.0 / (i + 1) as f64;
        }
    }
    0.0
}
