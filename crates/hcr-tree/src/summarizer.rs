//! LLM routing-summary generation with contrastive prompts.
//!
//! Every internal tree node gets a structured summary generated by an
//! external completion model. Sibling summaries already built for the same
//! parent are fed back into the prompt so the model can write specific
//! `excludes` lists. Generation never fails the build: after three parse
//! failures (a provider error counts as a failed attempt) the node gets an
//! observably-marked fallback summary built from the raw cluster text.

use hcr_core::provider::CompletionModel;
use hcr_core::RoutingSummary;
use serde::Deserialize;
use tracing::warn;

/// Maximum generation attempts before falling back.
const MAX_ATTEMPTS: usize = 3;

/// Output token cap per summary completion.
const SUMMARY_MAX_TOKENS: usize = 512;

/// Cluster content sample cap (characters) fed into the prompt.
const MAX_SAMPLE_CHARS: usize = 3000;

/// Raw-text cap (characters) the fallback summary draws words from.
const FALLBACK_TEXT_CHARS: usize = 500;

/// Theme marker for fallback summaries, visible to the evaluator.
pub const FALLBACK_THEME: &str = "(auto-fallback: unparseable cluster)";

const SUMMARIZE_SYSTEM: &str = "You are a routing summary generator for a hierarchical retrieval system. \
Your job: help a search system decide whether a user's query should be \
routed to THIS cluster or a sibling cluster.\n\n\
Rules:\n\
- 'includes': specific topics covered. Use terms a user would search for, \
not abstract categories. 5-8 items.\n\
- 'excludes': topics NOT here but in siblings. Be specific. 3-5 items.\n\
- 'key_entities': proper nouns, product names, system names from the content. \
5-10 items.\n\
- 'key_terms': searchable keywords and phrases a user would type. \
Include abbreviations, synonyms, and specific terms. 8-15 items.\n\n\
Respond with valid JSON only:\n\
{\"theme\": \"...\", \"includes\": [\"topic1\", \"topic2\"], \
\"excludes\": [\"topic_not_here1\"], \"key_entities\": [\"entity1\"], \
\"key_terms\": [\"term1\", \"term2\"]}";

/// Summary JSON shape expected back from the model. `theme` and `includes`
/// are required; the rest default to empty.
#[derive(Debug, Deserialize)]
struct RawSummary {
    theme: String,
    includes: Vec<String>,
    #[serde(default)]
    excludes: Vec<String>,
    #[serde(default)]
    key_entities: Vec<String>,
    #[serde(default)]
    key_terms: Vec<String>,
}

/// Generate a contrastive routing summary for a cluster.
///
/// `sibling_summaries` are the summaries already built for this node's
/// siblings; they become the "what other clusters cover" context.
pub fn generate_routing_summary(
    llm: &dyn CompletionModel,
    cluster_texts: &[String],
    sibling_summaries: &[RoutingSummary],
) -> RoutingSummary {
    let prompt = build_prompt(cluster_texts, sibling_summaries);

    for attempt in 1..=MAX_ATTEMPTS {
        let response = match llm.complete(&prompt, SUMMARIZE_SYSTEM, SUMMARY_MAX_TOKENS) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    %err,
                    "routing summary completion failed"
                );
                continue;
            }
        };

        match parse_summary(&response) {
            Ok(summary) => return summary,
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    error = %err,
                    preview = %truncate_chars(&response, 150),
                    "routing summary parse failed"
                );
            }
        }
    }

    warn!("all summary attempts failed, using fallback summary");
    fallback_summary(cluster_texts)
}

fn build_prompt(cluster_texts: &[String], sibling_summaries: &[RoutingSummary]) -> String {
    let mut content_sample = cluster_texts.join("\n---\n");
    if content_sample.chars().count() > MAX_SAMPLE_CHARS {
        content_sample = format!("{}\n[truncated]", truncate_chars(&content_sample, MAX_SAMPLE_CHARS));
    }

    let sibling_context = if sibling_summaries.is_empty() {
        "(none — this is the first cluster)".to_string()
    } else {
        sibling_summaries
            .iter()
            .map(|s| format!("- {}: {}", s.theme, s.includes.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Generate a routing summary for this cluster of text chunks.\n\n\
         CLUSTER CONTENT (sample):\n{content_sample}\n\n\
         SIBLING SUMMARIES (what other clusters cover — use to write specific \"excludes\"):\n\
         {sibling_context}\n\n\
         Generate a routing summary. Be SPECIFIC, not abstract:\n\
         - BAD includes: [\"Billing Structures\", \"Pricing Configuration\"]\n\
         - GOOD includes: [\"rate plan charges\", \"invoice line items\", \"tiered pricing setup\"]\n\
         - BAD key_terms: [\"billing\", \"pricing\"]\n\
         - GOOD key_terms: [\"rate plan\", \"charge model\", \"tiered pricing\", \"per unit\", \
         \"invoice item\", \"subscription charge\", \"overage\"]\n\n\
         Use the ACTUAL terms and entities from the content, not paraphrased categories."
    )
}

fn parse_summary(response: &str) -> Result<RoutingSummary, serde_json::Error> {
    let raw: RawSummary = serde_json::from_str(extract_json(response))?;
    let summary = RoutingSummary {
        theme: raw.theme,
        includes: raw.includes,
        excludes: raw.excludes,
        key_entities: raw.key_entities,
        key_terms: raw.key_terms,
        content_snippet: String::new(),
    };
    if summary.theme.trim().is_empty() {
        // Force the retry path; the error value itself is discarded
        return Err(serde::de::Error::custom("theme must not be empty"));
    }
    Ok(summary)
}

/// Extract a JSON object from a response that may carry preamble or fences.
///
/// Fenced code block first, then the first-`{`-to-last-`}` span, then the
/// trimmed text as-is.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(fenced) = extract_fenced(text) {
        return fenced;
    }

    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if last > first {
            return &text[first..=last];
        }
    }

    text
}

fn extract_fenced(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip an optional language tag on the fence line
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Minimal summary from raw cluster text after all attempts failed.
///
/// `includes` takes the first distinct words longer than four characters,
/// `key_terms` the first distinct words longer than three, both from the
/// leading 500 characters of the joined text.
fn fallback_summary(cluster_texts: &[String]) -> RoutingSummary {
    let joined = cluster_texts.join(" ");
    let head = truncate_chars(&joined, FALLBACK_TEXT_CHARS);
    let words: Vec<&str> = head.split_whitespace().collect();

    RoutingSummary {
        theme: FALLBACK_THEME.to_string(),
        includes: distinct_words(&words, 4, 8),
        excludes: Vec::new(),
        key_entities: Vec::new(),
        key_terms: distinct_words(&words, 3, 10),
        content_snippet: String::new(),
    }
}

/// First `limit` distinct words strictly longer than `min_len`, in order.
fn distinct_words(words: &[&str], min_len: usize, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for word in words {
        if word.chars().count() > min_len && seen.insert(*word) {
            out.push((*word).to_string());
            if out.len() == limit {
                break;
            }
        }
    }
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcr_core::HcrError;

    /// Completion model returning a fixed response.
    struct FixedCompletion(String);

    impl CompletionModel for FixedCompletion {
        fn complete(&self, _: &str, _: &str, _: usize) -> Result<String, HcrError> {
            Ok(self.0.clone())
        }
    }

    /// Completion model that always errors.
    struct FailingCompletion;

    impl CompletionModel for FailingCompletion {
        fn complete(&self, _: &str, _: &str, _: usize) -> Result<String, HcrError> {
            Err(HcrError::Provider("down".to_string()))
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_plain_json() {
        let llm = FixedCompletion(
            r#"{"theme": "billing", "includes": ["rate plans"], "excludes": ["payments"],
                "key_entities": ["Zuora"], "key_terms": ["tiered pricing"]}"#
                .to_string(),
        );
        let summary = generate_routing_summary(&llm, &texts(&["some content"]), &[]);
        assert_eq!(summary.theme, "billing");
        assert_eq!(summary.includes, vec!["rate plans"]);
        assert_eq!(summary.excludes, vec!["payments"]);
    }

    #[test]
    fn test_parse_fenced_json_with_preamble() {
        let llm = FixedCompletion(
            "Here is the summary:\n```json\n{\"theme\": \"networks\", \"includes\": [\"tcp\"]}\n```\ndone"
                .to_string(),
        );
        let summary = generate_routing_summary(&llm, &texts(&["content"]), &[]);
        assert_eq!(summary.theme, "networks");
        assert!(summary.excludes.is_empty());
    }

    #[test]
    fn test_parse_brace_span_with_preamble() {
        let llm = FixedCompletion(
            "Sure! {\"theme\": \"space\", \"includes\": [\"orbits\"]} hope that helps".to_string(),
        );
        let summary = generate_routing_summary(&llm, &texts(&["content"]), &[]);
        assert_eq!(summary.theme, "space");
    }

    #[test]
    fn test_unparseable_response_falls_back() {
        let llm = FixedCompletion("I cannot produce JSON today".to_string());
        let summary = generate_routing_summary(
            &llm,
            &texts(&["alpha particle scattering demonstrates nuclear structure"]),
            &[],
        );
        assert_eq!(summary.theme, FALLBACK_THEME);
        // Distinct words longer than four chars, in order
        assert_eq!(summary.includes[0], "alpha");
        assert!(summary.includes.contains(&"particle".to_string()));
        // key_terms admits shorter words than includes
        assert!(summary.key_terms.len() >= summary.includes.len());
    }

    #[test]
    fn test_provider_error_falls_back() {
        let summary = generate_routing_summary(
            &FailingCompletion,
            &texts(&["completely ordinary sentence about geology"]),
            &[],
        );
        assert_eq!(summary.theme, FALLBACK_THEME);
        assert!(summary.excludes.is_empty());
        assert!(summary.key_entities.is_empty());
    }

    #[test]
    fn test_fallback_word_selection_caps() {
        let long_text = (0..40)
            .map(|i| format!("uniqueword{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let summary = generate_routing_summary(&FailingCompletion, &[long_text], &[]);
        assert!(summary.includes.len() <= 8);
        assert!(summary.key_terms.len() <= 10);
    }

    #[test]
    fn test_sibling_context_in_prompt() {
        let sibling = RoutingSummary {
            theme: "astronomy".to_string(),
            includes: vec!["telescopes".to_string()],
            ..Default::default()
        };
        let prompt = build_prompt(&texts(&["content"]), std::slice::from_ref(&sibling));
        assert!(prompt.contains("- astronomy: telescopes"));

        let no_siblings = build_prompt(&texts(&["content"]), &[]);
        assert!(no_siblings.contains("(none — this is the first cluster)"));
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("x {\"a\": 1} y"), "{\"a\": 1}");
        assert_eq!(extract_json("no braces"), "no braces");
    }
}
