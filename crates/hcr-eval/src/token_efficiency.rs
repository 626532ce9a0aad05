//! Token-efficiency curve: sufficiency rate as a function of budget.

use hcr_core::{HcrError, Query};
use serde::{Deserialize, Serialize};

use crate::baselines::RetrievalBaseline;
use crate::sufficiency::SufficiencyJudge;

/// Budgets swept by default. The last entry approximates "no budget".
pub const DEFAULT_BUDGETS: [u32; 6] = [200, 400, 600, 800, 1200, 10000];

/// A single point on the token-efficiency curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEfficiencyPoint {
    /// Token budget this point was measured at.
    pub budget: u32,
    /// Fraction of queries judged sufficient.
    pub sufficiency_rate: f64,
    /// Mean tokens actually packed.
    pub mean_tokens_used: f64,
    /// Number of queries evaluated.
    pub queries_evaluated: usize,
}

/// Full token-efficiency curve for one retrieval system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEfficiencyCurve {
    /// System the curve belongs to.
    pub system_name: String,
    /// Points in budget order.
    pub points: Vec<TokenEfficiencyPoint>,
}

/// Sweep budgets: retrieve at each budget, judge sufficiency, record the rate.
pub fn compute_efficiency_curve(
    baseline: &dyn RetrievalBaseline,
    queries: &[Query],
    judge: &SufficiencyJudge<'_>,
    budgets: &[u32],
) -> Result<TokenEfficiencyCurve, HcrError> {
    let mut curve = TokenEfficiencyCurve {
        system_name: baseline.name().to_string(),
        points: Vec::with_capacity(budgets.len()),
    };

    for &budget in budgets {
        let mut sufficient_count = 0usize;
        let mut total_tokens = 0.0f64;

        for query in queries {
            let chunks = baseline.retrieve(&query.text, budget)?;
            total_tokens += chunks.iter().map(|c| c.token_count as f64).sum::<f64>();
            let verdict = judge.evaluate(query, &chunks, budget)?;
            if verdict.is_sufficient {
                sufficient_count += 1;
            }
        }

        let n = queries.len();
        curve.points.push(TokenEfficiencyPoint {
            budget,
            sufficiency_rate: if n > 0 {
                sufficient_count as f64 / n as f64
            } else {
                0.0
            },
            mean_tokens_used: if n > 0 { total_tokens / n as f64 } else { 0.0 },
            queries_evaluated: n,
        });
    }

    Ok(curve)
}
