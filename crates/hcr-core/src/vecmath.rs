//! Vector math helpers for dense scoring.
//!
//! All embeddings in the hcr stack are expected to be L2-normalized, so
//! cosine similarity reduces to a dot product. Call sites renormalize where
//! the contract requires it (query vectors on entry, summary embeddings
//! before scoring).

/// Dot product of two equal-length vectors.
///
/// Returns 0.0 on length mismatch rather than panicking; mismatched inputs
/// score as irrelevant.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Return an L2-normalized copy of `v`.
///
/// A zero vector is returned unchanged (normalizing it would divide by zero).
pub fn l2_normalized(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Normalize `v` in place. Zero vectors are left unchanged.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity between two vectors, normalizing both sides.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Cosine distance (`1 - cosine similarity`), in `[0, 2]` for real vectors.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}
