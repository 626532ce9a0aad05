//! Provider interfaces for the external model collaborators.
//!
//! The engine consumes embeddings, cross-encoder scores, and routing-summary
//! completions as opaque inputs. Real model backends live outside this
//! workspace; implementations here are limited to offline/degraded providers
//! used by the evaluation harness and tests.
//!
//! All batched calls preserve input order: output row `i` corresponds to
//! input `i`.

use crate::HcrError;

/// Produces L2-normalized dense vectors for texts.
pub trait TextEmbedder {
    /// Embed a batch of texts, one row per input, order preserved.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HcrError>;

    /// Embed a single text (e.g. a query), returning one normalized vector.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, HcrError>;
}

/// Scores (query, text) pairs. Higher is more relevant; scores are signed.
pub trait CrossEncoderModel {
    /// Score a batch of pairs, order preserved.
    fn predict(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, HcrError>;
}

/// Text completion model used to synthesize routing summaries.
pub trait CompletionModel {
    /// Complete a prompt under a system message, bounded by `max_tokens`.
    fn complete(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: usize,
    ) -> Result<String, HcrError>;
}

/// Cross-encoder that scores every uncached pair 0.0.
///
/// Offline stand-in: with a warm score cache in front of it, evaluation
/// replays cached scores exactly; cache misses degrade to zero instead of
/// erroring.
#[derive(Debug, Default)]
pub struct NullCrossEncoder;

impl CrossEncoderModel for NullCrossEncoder {
    fn predict(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, HcrError> {
        Ok(vec![0.0; pairs.len()])
    }
}

/// Completion model that always fails.
///
/// Used when no LLM backend is configured: the summarizer's retry policy
/// exhausts and every node gets an observably-marked fallback summary.
#[derive(Debug, Default)]
pub struct NullCompletion;

impl CompletionModel for NullCompletion {
    fn complete(
        &self,
        _prompt: &str,
        _system: &str,
        _max_tokens: usize,
    ) -> Result<String, HcrError> {
        Err(HcrError::Provider(
            "no completion backend configured".to_string(),
        ))
    }
}
