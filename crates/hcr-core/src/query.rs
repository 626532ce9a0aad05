//! Query data model for benchmark evaluation.

use serde::{Deserialize, Serialize};

use crate::HcrError;

/// Query type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    /// Answerable from a single tree branch.
    SingleBranch,
    /// An entity whose mentions span several branches.
    EntitySpanning,
    /// Distractor-prone: plausible wrong branches exist.
    Dpi,
    /// Requires chaining evidence across chunks.
    MultiHop,
    /// Compares two or more subjects.
    Comparative,
    /// Aggregates over many chunks.
    Aggregation,
    /// Anchored to dates or ordering in time.
    Temporal,
    /// Underspecified phrasing.
    Ambiguous,
    /// Out of distribution: no supporting content exists.
    Ood,
}

/// Query difficulty for stratified evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A benchmark query with gold-standard annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Unique query identifier.
    pub id: String,
    /// Natural-language query text.
    pub text: String,
    /// Category tag.
    pub category: QueryCategory,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Whether the gold evidence fits a 400-token budget.
    #[serde(default = "default_budget_feasible")]
    pub budget_feasible_400: bool,
    /// Gold chunk identifiers. Never empty.
    pub gold_chunk_ids: Vec<String>,
    /// Gold answer string.
    pub gold_answer: String,
}

fn default_budget_feasible() -> bool {
    true
}

impl Query {
    /// Check construction invariants.
    pub fn validate(&self) -> Result<(), HcrError> {
        if self.gold_chunk_ids.is_empty() {
            return Err(HcrError::InvalidQuery(format!(
                "query '{}' has no gold chunk ids",
                self.id
            )));
        }
        Ok(())
    }
}
