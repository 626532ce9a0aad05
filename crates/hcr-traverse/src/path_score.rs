//! Path-relevance EMA for smoothing scores across tree depth.

/// Default weight for the current level's score.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Exponential moving average of path relevance.
///
/// Smooths the per-level score with the accumulated path score, so one noisy
/// level does not dominate the path: `alpha * current + (1 - alpha) * parent`.
/// The root's seed score is 1.0.
pub fn path_relevance_ema(current_score: f32, parent_score: f32, alpha: f32) -> f32 {
    alpha * current_score + (1.0 - alpha) * parent_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_midpoint_at_default_alpha() {
        assert!((path_relevance_ema(0.8, 0.4, DEFAULT_ALPHA) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_ema_alpha_extremes() {
        // alpha = 1: only the current score matters
        assert_eq!(path_relevance_ema(0.3, 0.9, 1.0), 0.3);
        // alpha = 0: only the parent path matters
        assert_eq!(path_relevance_ema(0.3, 0.9, 0.0), 0.9);
    }

    #[test]
    fn test_ema_from_root_seed() {
        // First level below the root smooths against the 1.0 seed
        let smoothed = path_relevance_ema(0.5, 1.0, DEFAULT_ALPHA);
        assert!((smoothed - 0.75).abs() < 1e-6);
    }
}
