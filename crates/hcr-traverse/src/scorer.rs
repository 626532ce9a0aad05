//! Cached cross-encoder scoring.
//!
//! Wraps the external cross-encoder model with the shared score cache.
//! Every `(query_text, id)` score is cached on first computation and reused
//! across queries and across retrieval systems: the tree traversal and the
//! flat cross-encoder baseline deliberately share one cache so repeated
//! evaluation replays identical scores.

use hcr_core::provider::CrossEncoderModel;
use hcr_core::store::CeScoreCache;
use hcr_core::HcrError;

/// Scores (query, text) pairs through the cache.
pub struct CrossEncoderScorer<'a> {
    model: &'a dyn CrossEncoderModel,
    cache: &'a CeScoreCache,
}

impl<'a> CrossEncoderScorer<'a> {
    /// Create a scorer over a model and a shared cache.
    pub fn new(model: &'a dyn CrossEncoderModel, cache: &'a CeScoreCache) -> Self {
        Self { model, cache }
    }

    /// Score a single (query, text) pair, cached under `id`.
    pub fn score(&self, query: &str, text: &str, id: &str) -> Result<f32, HcrError> {
        if let Some(cached) = self.cache.get(query, id) {
            return Ok(cached);
        }
        let scores = self
            .model
            .predict(&[(query.to_string(), text.to_string())])?;
        let score = scores.first().copied().unwrap_or(0.0);
        self.cache.insert(query, id, score);
        Ok(score)
    }

    /// Score a batch of texts against one query.
    ///
    /// `ids` align with `texts` and key the cache. Cached entries are
    /// resolved first; only the misses go to the model, in input order, and
    /// the returned scores land back in their original positions.
    pub fn score_batch(
        &self,
        query: &str,
        texts: &[String],
        ids: &[String],
    ) -> Result<Vec<f32>, HcrError> {
        debug_assert_eq!(texts.len(), ids.len());

        let mut scores = vec![0.0f32; texts.len()];
        let mut uncached_indices: Vec<usize> = Vec::new();
        let mut uncached_pairs: Vec<(String, String)> = Vec::new();

        for (i, (text, id)) in texts.iter().zip(ids.iter()).enumerate() {
            if let Some(cached) = self.cache.get(query, id) {
                scores[i] = cached;
            } else {
                uncached_indices.push(i);
                uncached_pairs.push((query.to_string(), text.clone()));
            }
        }

        if !uncached_pairs.is_empty() {
            let fresh = self.model.predict(&uncached_pairs)?;
            if fresh.len() != uncached_pairs.len() {
                return Err(HcrError::Provider(format!(
                    "cross-encoder returned {} scores for {} pairs",
                    fresh.len(),
                    uncached_pairs.len()
                )));
            }
            for (&i, score) in uncached_indices.iter().zip(fresh) {
                scores[i] = score;
                self.cache.insert(query, &ids[i], score);
            }
        }

        Ok(scores)
    }
}
