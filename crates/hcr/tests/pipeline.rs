//! End-to-end pipeline tests: corpus -> cluster tree -> dual-path retrieval.

use hcr::prelude::*;
use hcr_core::provider::{CompletionModel, CrossEncoderModel, TextEmbedder};
use hcr_core::store::CeScoreCache;
use hcr_core::HcrError;

/// Embedder with fixed rules for this scenario: the query embeds along the
/// first axis; summary texts embed by which cluster snippet they carry.
struct ScenarioEmbedder;

impl TextEmbedder for ScenarioEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HcrError> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, HcrError> {
        if text == "alpha" {
            return Ok(vec![1.0, 0.0, 0.0, 0.0]);
        }
        if text.contains("Sample: alpha one") {
            // Summary of the {c-0, c-2} cluster (and of the root)
            return Ok(vec![0.95, 0.05, 0.0, 0.0]);
        }
        if text.contains("Sample: bravo two") {
            // Summary of the {c-1, c-3, c-4} cluster
            return Ok(vec![0.0, 0.577, 0.577, 0.577]);
        }
        Ok(vec![0.0, 0.0, 0.0, 0.0])
    }
}

/// Cross-encoder scoring by query-term containment.
struct KeywordModel;

impl CrossEncoderModel for KeywordModel {
    fn predict(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, HcrError> {
        Ok(pairs
            .iter()
            .map(|(query, text)| {
                query
                    .split_whitespace()
                    .filter(|term| text.contains(term))
                    .count() as f32
            })
            .collect())
    }
}

/// Completion model emitting a minimal valid summary.
struct JsonCompletion;

impl CompletionModel for JsonCompletion {
    fn complete(&self, _: &str, _: &str, _: usize) -> Result<String, HcrError> {
        Ok(r#"{"theme": "cluster", "includes": ["things"]}"#.to_string())
    }
}

fn corpus() -> (Vec<Chunk>, Vec<Vec<f32>>) {
    let chunks = vec![
        Chunk::new("c-0", "doc", "alpha one", 2).unwrap(),
        Chunk::new("c-1", "doc", "bravo two", 2).unwrap(),
        Chunk::new("c-2", "doc", "alpha three", 2).unwrap(),
        Chunk::new("c-3", "doc", "charlie four", 2).unwrap(),
        Chunk::new("c-4", "doc", "delta five", 2).unwrap(),
    ];
    let embeddings = vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.0],
        vec![0.9, 0.1, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0],
    ];
    (chunks, embeddings)
}

#[test]
fn two_cluster_pipeline_routes_to_matching_chunk() {
    let (chunks, embeddings) = corpus();
    let embedder = ScenarioEmbedder;
    let llm = JsonCompletion;

    let tree = TreeBuilder::new(&embedder, &llm)
        .with_layout(1, 2)
        .build(&chunks, &embeddings)
        .unwrap();
    tree.validate().unwrap();

    // Clustering groups the near-duplicate pair away from the rest
    let root = tree.root();
    assert_eq!(root.child_ids.len(), 2);
    let mut cluster_sizes: Vec<usize> = root
        .child_ids
        .iter()
        .map(|b| tree.descendant_leaves(b).len())
        .collect();
    cluster_sizes.sort();
    assert_eq!(cluster_sizes, vec![2, 3]);

    let cache = CeScoreCache::new();
    let ce_model = KeywordModel;
    let scorer = CrossEncoderScorer::new(&ce_model, &cache);
    let baseline = HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

    // The beam descends into the {c-0, c-2} branch and the top-ranked chunk
    // is the exact-match row
    let ranked = baseline.rank("alpha", 10).unwrap();
    assert_eq!(ranked[0].0, "c-0");

    baseline.store_beam_record("q-alpha");
    let records = baseline.beam_records();
    let level_1 = &records["q-alpha"][&1];
    let alpha_branch = root
        .child_ids
        .iter()
        .find(|b| tree.descendant_leaves(b).len() == 2)
        .unwrap();
    assert!(level_1.contains(alpha_branch));
}

#[test]
fn rank_is_deterministic_with_shared_cache() {
    let (chunks, embeddings) = corpus();
    let embedder = ScenarioEmbedder;
    let llm = JsonCompletion;
    let tree = TreeBuilder::new(&embedder, &llm)
        .with_layout(1, 2)
        .build(&chunks, &embeddings)
        .unwrap();

    let cache = CeScoreCache::new();
    let ce_model = KeywordModel;
    let scorer = CrossEncoderScorer::new(&ce_model, &cache);
    let baseline = HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

    let first = baseline.rank("alpha", 10).unwrap();
    let second = baseline.rank("alpha", 10).unwrap();
    assert_eq!(first, second);
    assert!(!cache.is_empty());
}

#[test]
fn retrieve_respects_hard_budget() {
    let (chunks, embeddings) = corpus();
    let embedder = ScenarioEmbedder;
    let llm = JsonCompletion;
    let tree = TreeBuilder::new(&embedder, &llm)
        .with_layout(1, 2)
        .build(&chunks, &embeddings)
        .unwrap();

    let cache = CeScoreCache::new();
    let ce_model = KeywordModel;
    let scorer = CrossEncoderScorer::new(&ce_model, &cache);
    let baseline = HcrBaseline::new(&tree, &chunks, &embeddings, &embedder, &scorer).unwrap();

    // Budget for exactly one two-token chunk
    let packed = baseline.retrieve("alpha", 2).unwrap();
    assert_eq!(packed.len(), 1);
    assert_eq!(packed[0].id, "c-0");

    // Zero budget packs nothing
    assert!(baseline.retrieve("alpha", 0).unwrap().is_empty());
}

#[test]
fn tree_round_trip_preserves_structure() {
    let (chunks, embeddings) = corpus();
    let embedder = ScenarioEmbedder;
    let llm = JsonCompletion;
    let tree = TreeBuilder::new(&embedder, &llm)
        .with_layout(1, 2)
        .build(&chunks, &embeddings)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    tree.save(&path).unwrap();
    let loaded = Tree::load(&path).unwrap();
    assert_eq!(tree, loaded);
}
