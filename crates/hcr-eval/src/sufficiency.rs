//! LLM-as-judge sufficiency evaluation.
//!
//! Given a question, the gold answer, and the packed context, an external
//! judge model decides whether the context is sufficient to answer
//! correctly. Judge verdicts are cached on disk keyed by the query and the
//! exact chunk set, so re-runs are free.

use std::path::PathBuf;

use hcr_core::provider::CompletionModel;
use hcr_core::store::text_key;
use hcr_core::{Chunk, HcrError, Query};
use serde::{Deserialize, Serialize};
use tracing::warn;

const JUDGE_MAX_TOKENS: usize = 256;

const JUDGE_SYSTEM: &str = "You are an evaluation judge. Given a question, a gold-standard answer, \
and retrieved context chunks, determine if the context is SUFFICIENT \
to answer the question correctly.\n\n\
Respond with valid JSON only:\n\
{\"is_sufficient\": true/false, \"reasoning\": \"brief explanation\"}";

/// Sufficiency verdict for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyResult {
    /// Query this verdict covers.
    pub query_id: String,
    /// Budget the context was packed under.
    pub token_budget: u32,
    /// Whether the judge found the context sufficient.
    pub is_sufficient: bool,
    /// The judge's stated reasoning.
    pub judge_reasoning: String,
}

/// Judge response shape.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    is_sufficient: bool,
    reasoning: String,
}

/// File cache for judge verdicts, keyed by query id and chunk-set hash.
#[derive(Debug, Clone)]
pub struct JudgeCache {
    dir: PathBuf,
}

impl JudgeCache {
    /// Open a cache rooted at `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HcrError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, query_id: &str, chunk_ids: &[String]) -> PathBuf {
        let mut sorted = chunk_ids.to_vec();
        sorted.sort();
        let ids_hash = text_key(&sorted.join(","));
        self.dir.join(format!("{query_id}_{ids_hash}.json"))
    }

    /// Load a cached verdict. Absence is not an error.
    pub fn load(
        &self,
        query_id: &str,
        chunk_ids: &[String],
    ) -> Result<Option<SufficiencyResult>, HcrError> {
        let path = self.path(query_id, chunk_ids);
        if !path.exists() {
            return Ok(None);
        }
        let result = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        Ok(Some(result))
    }

    /// Persist a verdict.
    pub fn save(
        &self,
        query_id: &str,
        chunk_ids: &[String],
        result: &SufficiencyResult,
    ) -> Result<(), HcrError> {
        let path = self.path(query_id, chunk_ids);
        std::fs::write(path, serde_json::to_string_pretty(result)?)?;
        Ok(())
    }
}

/// Evaluates whether retrieved chunks sufficiently answer a query.
pub struct SufficiencyJudge<'a> {
    llm: &'a dyn CompletionModel,
    cache: Option<JudgeCache>,
}

impl<'a> SufficiencyJudge<'a> {
    /// Create a judge without caching.
    pub fn new(llm: &'a dyn CompletionModel) -> Self {
        Self { llm, cache: None }
    }

    /// Attach a verdict cache.
    pub fn with_cache(mut self, cache: JudgeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Evaluate one query's packed context.
    ///
    /// An unparseable judge response counts as insufficient with the parse
    /// failure recorded as the reasoning; a provider failure does the same.
    pub fn evaluate(
        &self,
        query: &Query,
        chunks: &[Chunk],
        token_budget: u32,
    ) -> Result<SufficiencyResult, HcrError> {
        let chunk_ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.load(&query.id, &chunk_ids)? {
                return Ok(cached);
            }
        }

        let context = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        let total_tokens: u32 = chunks.iter().map(|c| c.token_count).sum();

        let prompt = format!(
            "Question: {}\n\nGold Answer: {}\n\nRetrieved Context ({} tokens):\n{}\n\n\
             Is the retrieved context sufficient to correctly answer the question?",
            query.text, query.gold_answer, total_tokens, context
        );

        let (is_sufficient, reasoning) =
            match self.llm.complete(&prompt, JUDGE_SYSTEM, JUDGE_MAX_TOKENS) {
                Ok(response) => match serde_json::from_str::<RawVerdict>(response.trim()) {
                    Ok(verdict) => (verdict.is_sufficient, verdict.reasoning),
                    Err(err) => {
                        warn!(query_id = %query.id, %err, "failed to parse judge response");
                        (false, format!("Failed to parse judge response: {err}"))
                    }
                },
                Err(err) => {
                    warn!(query_id = %query.id, %err, "judge completion failed");
                    (false, format!("Judge completion failed: {err}"))
                }
            };

        let result = SufficiencyResult {
            query_id: query.id.clone(),
            token_budget,
            is_sufficient,
            judge_reasoning: reasoning,
        };

        if let Some(cache) = &self.cache {
            cache.save(&query.id, &chunk_ids, &result)?;
        }

        Ok(result)
    }
}
