//! Greedy token packing with an optional redundancy penalty.

use hcr_core::{vecmath, Chunk};

/// Pack chunks greedily by score until the token budget is exhausted.
///
/// Walks candidates in score-descending order (stable: ties keep input
/// order). A chunk that would exceed the budget is skipped, not a stopping
/// point; a later, smaller chunk may still fit. When `embeddings` are
/// provided and `redundancy_lambda > 0`, each candidate's score is reduced
/// by `lambda * max_sim` against the already-selected chunks and dropped
/// when the adjusted score goes negative.
///
/// Returns the selected chunks in selection order. The budget is a hard cap:
/// the selected token counts never sum above it.
///
/// # Example
///
/// ```rust
/// use hcr_core::Chunk;
/// use hcr_traverse::greedy_token_packing;
///
/// let chunks = vec![
///     Chunk::new("c-0", "doc", "first", 30).unwrap(),
///     Chunk::new("c-1", "doc", "second", 20).unwrap(),
/// ];
/// let packed = greedy_token_packing(&chunks, &[0.4, 0.9], 20, 0.0, None);
/// assert_eq!(packed.len(), 1);
/// assert_eq!(packed[0].id, "c-1");
/// ```
pub fn greedy_token_packing(
    chunks: &[Chunk],
    scores: &[f32],
    budget: u32,
    redundancy_lambda: f32,
    embeddings: Option<&[Vec<f32>]>,
) -> Vec<Chunk> {
    if chunks.is_empty() {
        return Vec::new();
    }

    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<Chunk> = Vec::new();
    let mut selected_indices: Vec<usize> = Vec::new();
    let mut tokens_used: u32 = 0;

    for (orig_idx, score) in indexed {
        let chunk = &chunks[orig_idx];
        if tokens_used + chunk.token_count > budget {
            continue;
        }

        if let Some(embeddings) = embeddings {
            if redundancy_lambda > 0.0 && !selected_indices.is_empty() {
                let candidate = &embeddings[orig_idx];
                let max_sim = selected_indices
                    .iter()
                    .map(|&sel| vecmath::dot(candidate, &embeddings[sel]))
                    .fold(0.0f32, f32::max);
                if score - redundancy_lambda * max_sim < 0.0 {
                    continue;
                }
            }
        }

        selected.push(chunk.clone());
        selected_indices.push(orig_idx);
        tokens_used += chunk.token_count;
    }

    selected
}
