//! Per-level routing accuracy (epsilon).
//!
//! Epsilon measures the fraction of queries where the recorded beam at a
//! given tree level does NOT contain any gold chunk's ancestor at that
//! level. Lower is better; epsilon = 0 means perfect routing. This is the
//! diagnostic that separates "the tree is unroutable" from "the ranking at
//! the leaves is weak".

use std::collections::{BTreeMap, BTreeSet, HashMap};

use hcr_core::{Query, Tree};
use serde::{Deserialize, Serialize};

/// Per-level routing accuracy measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsilonMeasurement {
    /// Tree level this measurement covers.
    pub level: u32,
    /// Queries whose beam recorded this level.
    pub queries_evaluated: usize,
    /// Queries with a gold-chunk ancestor in the recorded beam.
    pub correct_branch_in_beam: usize,
    /// `1 - correct / evaluated`, in `[0, 1]`.
    pub epsilon: f64,
}

/// Compute per-level routing accuracy from recorded beams.
///
/// `beam_results` maps query id to that query's per-level beam contents. A
/// query counts as correct at a level when ANY of its gold chunks has its
/// ancestor at that level present in the recorded beam.
pub fn compute_epsilon(
    tree: &Tree,
    queries: &[Query],
    beam_results: &HashMap<String, BTreeMap<u32, Vec<String>>>,
) -> Vec<EpsilonMeasurement> {
    // Collect every level any query's beam recorded
    let mut all_levels: BTreeSet<u32> = BTreeSet::new();
    for level_beams in beam_results.values() {
        all_levels.extend(level_beams.keys().copied());
    }

    let mut measurements = Vec::new();

    for level in all_levels {
        let mut evaluated = 0usize;
        let mut correct = 0usize;

        for query in queries {
            let Some(level_beams) = beam_results.get(&query.id) else {
                continue;
            };
            let Some(level_beam) = level_beams.get(&level) else {
                continue;
            };

            evaluated += 1;

            let found = query.gold_chunk_ids.iter().any(|gold_chunk_id| {
                tree.ancestor_at_level(gold_chunk_id, level)
                    .is_some_and(|ancestor| level_beam.contains(&ancestor))
            });
            if found {
                correct += 1;
            }
        }

        if evaluated > 0 {
            measurements.push(EpsilonMeasurement {
                level,
                queries_evaluated: evaluated,
                correct_branch_in_beam: correct,
                epsilon: 1.0 - (correct as f64 / evaluated as f64),
            });
        }
    }

    measurements
}
