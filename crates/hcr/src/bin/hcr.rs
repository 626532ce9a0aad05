//! Benchmark harness CLI.
//!
//! Drives evaluation over a prepared corpus directory. Model outputs
//! (embeddings, cross-encoder scores, judge verdicts) replay from the
//! persisted stores, so runs are deterministic and offline; cache misses
//! degrade to zero scores rather than failing a query.
//!
//! Exit codes: 0 on normal completion, 1 when a required artifact is
//! missing, 2 when fail-fast mode KILLs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hcr::core::provider::{NullCompletion, NullCrossEncoder};
use hcr::eval::runner::DEFAULT_TOKEN_BUDGET;
use hcr::eval::token_efficiency::{compute_efficiency_curve, DEFAULT_BUDGETS};
use hcr::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Quick pipeline validation (no queries required).
    Sanity,
    /// Evaluate BM25, hybrid, and flat-CE with IR metrics.
    Baselines,
    /// Build/load the tree, evaluate HCR, compute epsilon + tree quality.
    Hcr,
    /// Run the kill gates and emit a single PASSED/KILLED record.
    Failfast,
    /// Baselines + HCR + sufficiency judge + token-efficiency curve.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scale {
    Small,
    Medium,
    Large,
}

impl Scale {
    fn dir_name(self) -> &'static str {
        match self {
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Hierarchical context retrieval benchmark", long_about = None)]
struct Cli {
    /// Evaluation mode.
    #[arg(long, value_enum, default_value = "sanity")]
    mode: Mode,

    /// Corpus scale selecting default directories under benchmark/.
    #[arg(long, value_enum, default_value = "small")]
    scale: Scale,

    /// Corpus directory override (chunks.json + embedding stores).
    #[arg(long)]
    corpus_dir: Option<PathBuf>,

    /// Query suite override.
    #[arg(long)]
    queries_path: Option<PathBuf>,

    /// Results directory override.
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Cached tree override.
    #[arg(long)]
    tree_path: Option<PathBuf>,

    /// Cache directory override (cross-encoder scores, judge verdicts).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Tree depth for building.
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Tree branching factor for building.
    #[arg(long, default_value_t = 10)]
    branching: usize,

    /// Limit chunks for quick runs.
    #[arg(long)]
    max_chunks: Option<usize>,
}

/// Resolved artifact locations for one run.
struct Layout {
    corpus_dir: PathBuf,
    queries_path: PathBuf,
    results_dir: PathBuf,
    tree_path: PathBuf,
    ce_cache_path: PathBuf,
    judge_cache_dir: PathBuf,
}

impl Layout {
    fn resolve(cli: &Cli) -> Self {
        let base = PathBuf::from("benchmark").join(cli.scale.dir_name());
        let cache_dir = cli.cache_dir.clone().unwrap_or_else(|| base.join("cache"));
        Self {
            corpus_dir: cli.corpus_dir.clone().unwrap_or_else(|| base.join("corpus")),
            queries_path: cli
                .queries_path
                .clone()
                .unwrap_or_else(|| base.join("queries").join("queries.json")),
            results_dir: cli
                .results_dir
                .clone()
                .unwrap_or_else(|| base.join("results")),
            tree_path: cli
                .tree_path
                .clone()
                .unwrap_or_else(|| base.join("trees").join("tree.json")),
            ce_cache_path: cache_dir.join("cross_encoder").join("scores.json"),
            judge_cache_dir: cache_dir.join("judge"),
        }
    }
}

/// Everything a mode needs: the shared corpus, providers, and layout.
struct RunCtx<'a> {
    layout: &'a Layout,
    chunks: &'a [Chunk],
    embeddings: &'a [Vec<f32>],
    embedder: &'a StoredEmbedder,
    scorer: &'a CrossEncoderScorer<'a>,
    queries: &'a [Query],
    depth: usize,
    branching: usize,
}

fn load_chunks(corpus_dir: &Path, max_chunks: Option<usize>) -> anyhow::Result<Vec<Chunk>> {
    let path = corpus_dir.join("chunks.json");
    if !path.exists() {
        bail!(
            "no chunks found at {}; prepare the corpus first",
            path.display()
        );
    }
    let mut chunks: Vec<Chunk> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    for chunk in &chunks {
        chunk.validate()?;
    }
    if let Some(max) = max_chunks {
        chunks.truncate(max);
    }
    info!(count = chunks.len(), "loaded chunks");
    Ok(chunks)
}

fn load_chunk_embeddings(corpus_dir: &Path, chunks: &[Chunk]) -> anyhow::Result<Vec<Vec<f32>>> {
    let store = EmbeddingStore::new(corpus_dir)?;
    let Some((ids, rows)) = store.load("chunks")? else {
        bail!(
            "no chunk embedding store under {}; embed the corpus first",
            corpus_dir.display()
        );
    };
    let by_id: HashMap<String, Vec<f32>> = ids.into_iter().zip(rows).collect();
    chunks
        .iter()
        .map(|chunk| {
            by_id
                .get(&chunk.id)
                .cloned()
                .with_context(|| format!("no embedding for chunk '{}'", chunk.id))
        })
        .collect()
}

/// Text embedder replaying the persisted `texts` store (queries, summary
/// texts). Unknown texts embed as zero vectors.
fn load_stored_embedder(corpus_dir: &Path) -> anyhow::Result<StoredEmbedder> {
    let store = EmbeddingStore::new(corpus_dir)?;
    let mut embedder = StoredEmbedder::new();
    embedder.load_store(&store, "texts")?;
    if embedder.dim() == 0 {
        warn!(
            "no texts embedding store under {}; query embeddings degrade to zero vectors",
            corpus_dir.display()
        );
    }
    Ok(embedder)
}

fn load_queries(path: &Path) -> anyhow::Result<Vec<Query>> {
    let suite = QuerySuite::load(path).with_context(|| {
        format!("no query suite at {}; generate queries first", path.display())
    })?;
    info!(count = suite.len(), "loaded queries");
    Ok(suite.queries)
}

fn log_retrieval(name: &str, packed: &[Chunk]) {
    let tokens: u32 = packed.iter().map(|c| c.token_count).sum();
    info!(system = name, chunks = packed.len(), tokens, "retrieved");
}

fn run_sanity(ctx: &RunCtx<'_>) -> anyhow::Result<()> {
    info!("=== SANITY CHECK ===");
    let probe = "company values and culture";

    let bm25 = Bm25Baseline::new(ctx.chunks);
    log_retrieval("bm25", &bm25.retrieve(probe, DEFAULT_TOKEN_BUDGET)?);

    let hybrid = HybridBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder)?;
    log_retrieval("hybrid-rrf", &hybrid.retrieve(probe, DEFAULT_TOKEN_BUDGET)?);

    let flat_ce =
        FlatCeBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder, ctx.scorer)?;
    log_retrieval("flat-ce", &flat_ce.retrieve(probe, DEFAULT_TOKEN_BUDGET)?);

    info!("=== SANITY CHECK PASSED ===");
    Ok(())
}

fn run_baselines(ctx: &RunCtx<'_>) -> anyhow::Result<Vec<BenchmarkResult>> {
    info!("=== BASELINE EVALUATION ===");
    let mut results = Vec::new();

    let bm25 = Bm25Baseline::new(ctx.chunks);
    results.push(evaluate_baseline(
        &bm25,
        ctx.queries,
        ctx.chunks.len(),
        DEFAULT_TOKEN_BUDGET,
    )?);

    let hybrid = HybridBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder)?;
    results.push(evaluate_baseline(
        &hybrid,
        ctx.queries,
        ctx.chunks.len(),
        DEFAULT_TOKEN_BUDGET,
    )?);

    let flat_ce =
        FlatCeBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder, ctx.scorer)?;
    results.push(evaluate_baseline(
        &flat_ce,
        ctx.queries,
        ctx.chunks.len(),
        DEFAULT_TOKEN_BUDGET,
    )?);

    let output = ctx.layout.results_dir.join("baseline_results.json");
    hcr::eval::save_results(&results, &output)?;
    info!(path = %output.display(), "baseline results saved");

    println!("{}", format_comparison_table(&results));
    Ok(results)
}

fn load_or_build_tree(ctx: &RunCtx<'_>) -> anyhow::Result<Tree> {
    if ctx.layout.tree_path.exists() {
        info!(path = %ctx.layout.tree_path.display(), "loading cached tree");
        return Ok(Tree::load(&ctx.layout.tree_path)?);
    }

    // No completion backend in the offline harness: every summary degrades
    // to the observably-marked fallback. Live builds cache their tree here.
    warn!("no cached tree, building with fallback summaries");
    let llm = NullCompletion;
    let tree = TreeBuilder::new(ctx.embedder, &llm)
        .with_layout(ctx.depth, ctx.branching)
        .build(ctx.chunks, ctx.embeddings)?;
    tree.save(&ctx.layout.tree_path)?;
    info!(
        path = %ctx.layout.tree_path.display(),
        nodes = tree.nodes.len(),
        depth = tree.depth,
        "tree built and cached"
    );
    Ok(tree)
}

struct HcrRunOutput {
    result: BenchmarkResult,
    sibling_distinctiveness: f64,
}

fn run_hcr(ctx: &RunCtx<'_>) -> anyhow::Result<HcrRunOutput> {
    info!("=== HCR EVALUATION ===");
    let tree = load_or_build_tree(ctx)?;

    let leaf_count = tree.nodes.values().filter(|n| n.is_leaf).count();
    info!(
        leaves = leaf_count,
        internal = tree.nodes.len() - leaf_count,
        root_branches = tree.root().child_ids.len(),
        "tree structure"
    );

    let sd = sibling_distinctiveness(&tree);
    info!(
        sibling_distinctiveness = sd,
        kill_threshold = SIBLING_DISTINCTIVENESS_KILL,
        "tree quality"
    );
    if sd < SIBLING_DISTINCTIVENESS_KILL {
        warn!(
            sibling_distinctiveness = sd,
            "KILL: tree is too homogeneous for effective routing"
        );
    }

    let hcr_baseline =
        HcrBaseline::new(&tree, ctx.chunks, ctx.embeddings, ctx.embedder, ctx.scorer)?;
    let mut result = evaluate_hcr(
        &hcr_baseline,
        ctx.queries,
        ctx.chunks.len(),
        DEFAULT_TOKEN_BUDGET,
    )?;

    let measurements = compute_epsilon(&tree, ctx.queries, &hcr_baseline.beam_records());
    for m in &measurements {
        info!(
            level = m.level,
            epsilon = m.epsilon,
            correct = m.correct_branch_in_beam,
            evaluated = m.queries_evaluated,
            "per-level routing accuracy"
        );
    }
    result.epsilon_per_level = measurements;

    let per_query =
        hcr::eval::per_query_records(&hcr_baseline, ctx.queries, DEFAULT_TOKEN_BUDGET)?;
    std::fs::create_dir_all(&ctx.layout.results_dir)?;
    std::fs::write(
        ctx.layout.results_dir.join("hcr_per_query_results.json"),
        serde_json::to_string_pretty(&per_query)?,
    )?;
    std::fs::write(
        ctx.layout.results_dir.join("hcr_results.json"),
        serde_json::to_string_pretty(&result)?,
    )?;

    // Comparison against previously saved baselines
    let mut all_results =
        hcr::eval::load_results(&ctx.layout.results_dir.join("baseline_results.json"))?;
    all_results.push(result.clone());
    println!("{}", format_comparison_table(&all_results));

    if let Some(ce) = all_results.iter().find(|r| r.system_name == "flat-ce") {
        let delta = result.ndcg_at_10 - ce.ndcg_at_10;
        let token_delta = result.mean_tokens_used - ce.mean_tokens_used;
        println!("\nHCR vs flat-ce (kill baseline):");
        println!(
            "  nDCG@10 delta: {delta:+.4} ({})",
            if delta > 0.0 { "WIN" } else { "LOSE" }
        );
        println!("  Token delta:   {token_delta:+.0}");
    }
    for m in &result.epsilon_per_level {
        println!("  Level {}: epsilon={:.4}", m.level, m.epsilon);
    }
    println!("  Sibling distinctiveness: {sd:.4} (kill < {SIBLING_DISTINCTIVENESS_KILL})");

    Ok(HcrRunOutput {
        result,
        sibling_distinctiveness: sd,
    })
}

fn run_failfast(ctx: &RunCtx<'_>) -> anyhow::Result<FailFastOutcome> {
    // The gates need the kill baseline's nDCG; evaluate it fresh so the
    // verdict never depends on stale saved results
    let flat_ce =
        FlatCeBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder, ctx.scorer)?;
    let ce_result = evaluate_baseline(
        &flat_ce,
        ctx.queries,
        ctx.chunks.len(),
        DEFAULT_TOKEN_BUDGET,
    )?;

    let hcr_run = run_hcr(ctx)?;

    let l1_epsilon = hcr_run
        .result
        .epsilon_per_level
        .iter()
        .find(|m| m.level == 1)
        .map(|m| m.epsilon);
    let ndcg_delta = hcr_run.result.ndcg_at_10 - ce_result.ndcg_at_10;

    let outcome = fail_fast_check(
        hcr_run.sibling_distinctiveness,
        l1_epsilon,
        Some(ndcg_delta),
    );

    std::fs::create_dir_all(&ctx.layout.results_dir)?;
    std::fs::write(
        ctx.layout.results_dir.join("failfast_outcome.json"),
        serde_json::to_string_pretty(&outcome)?,
    )?;

    match outcome.status {
        FailFastStatus::Passed => println!("FAILFAST: PASSED"),
        FailFastStatus::Killed => println!(
            "FAILFAST: KILLED ({} = {:.4}, threshold {:.4})",
            outcome.metric.as_deref().unwrap_or("unknown"),
            outcome.value.unwrap_or(f64::NAN),
            outcome.threshold.unwrap_or(f64::NAN),
        ),
    }
    Ok(outcome)
}

fn run_full(ctx: &RunCtx<'_>) -> anyhow::Result<()> {
    let mut results = run_baselines(ctx)?;
    let hcr_run = run_hcr(ctx)?;
    results.push(hcr_run.result);

    // Sufficiency judge: verdicts replay from the cache; without cached
    // verdicts the null backend marks everything insufficient
    let judge_llm = NullCompletion;
    let judge = SufficiencyJudge::new(&judge_llm)
        .with_cache(JudgeCache::new(&ctx.layout.judge_cache_dir)?);

    let tree = Tree::load(&ctx.layout.tree_path)?;
    let bm25 = Bm25Baseline::new(ctx.chunks);
    let hybrid = HybridBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder)?;
    let flat_ce =
        FlatCeBaseline::new(ctx.chunks, ctx.embeddings.to_vec(), ctx.embedder, ctx.scorer)?;
    let hcr_baseline =
        HcrBaseline::new(&tree, ctx.chunks, ctx.embeddings, ctx.embedder, ctx.scorer)?;
    let baselines: Vec<&dyn RetrievalBaseline> = vec![&bm25, &hybrid, &flat_ce, &hcr_baseline];

    for baseline in baselines {
        let mut sufficient = 0usize;
        for query in ctx.queries {
            let packed = baseline.retrieve(&query.text, DEFAULT_TOKEN_BUDGET)?;
            if judge
                .evaluate(query, &packed, DEFAULT_TOKEN_BUDGET)?
                .is_sufficient
            {
                sufficient += 1;
            }
        }
        let rate = if ctx.queries.is_empty() {
            0.0
        } else {
            sufficient as f64 / ctx.queries.len() as f64
        };
        if let Some(result) = results.iter_mut().find(|r| r.system_name == baseline.name()) {
            result.sufficiency_at_400 = rate;
        }
    }

    let curve = compute_efficiency_curve(&hcr_baseline, ctx.queries, &judge, &DEFAULT_BUDGETS)?;
    std::fs::write(
        ctx.layout.results_dir.join("token_efficiency.json"),
        serde_json::to_string_pretty(&curve)?,
    )?;

    hcr::eval::save_results(&results, &ctx.layout.results_dir.join("full_results.json"))?;
    println!("{}", format_comparison_table(&results));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let layout = Layout::resolve(&cli);

    let chunks = load_chunks(&layout.corpus_dir, cli.max_chunks)?;
    let embeddings = load_chunk_embeddings(&layout.corpus_dir, &chunks)?;
    let embedder = load_stored_embedder(&layout.corpus_dir)?;

    let ce_cache = CeScoreCache::load(&layout.ce_cache_path)?;
    let ce_model = NullCrossEncoder;
    let scorer = CrossEncoderScorer::new(&ce_model, &ce_cache);

    // Sanity mode runs without a query suite
    let queries = if cli.mode == Mode::Sanity {
        Vec::new()
    } else {
        load_queries(&layout.queries_path)?
    };

    let ctx = RunCtx {
        layout: &layout,
        chunks: &chunks,
        embeddings: &embeddings,
        embedder: &embedder,
        scorer: &scorer,
        queries: &queries,
        depth: cli.depth,
        branching: cli.branching,
    };

    let outcome = match cli.mode {
        Mode::Sanity => {
            run_sanity(&ctx)?;
            None
        }
        Mode::Baselines => {
            run_baselines(&ctx)?;
            None
        }
        Mode::Hcr => {
            run_hcr(&ctx)?;
            None
        }
        Mode::Failfast => Some(run_failfast(&ctx)?),
        Mode::Full => {
            run_full(&ctx)?;
            None
        }
    };

    ce_cache.persist(&layout.ce_cache_path)?;

    if let Some(outcome) = outcome {
        if outcome.status == FailFastStatus::Killed {
            std::process::exit(2);
        }
    }
    Ok(())
}
