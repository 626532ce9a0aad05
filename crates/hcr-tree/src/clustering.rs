//! Top-down k-way clustering of chunk embeddings.
//!
//! Recursive k-means: each level splits into `min(branching, N)` clusters,
//! then recurses into every non-empty cluster with one less level of depth.
//! The result is a balanced cluster hierarchy the tree builder materializes
//! into summary-tree nodes.
//!
//! Clustering is deterministic: every k-means call runs `n_init` restarts
//! from a seed-42 RNG and keeps the assignment with the lowest inertia.

use hcr_core::HcrError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed RNG seed for reproducible clustering.
const KMEANS_SEED: u64 = 42;

/// Number of k-means restarts; the best inertia wins.
const KMEANS_N_INIT: usize = 10;

/// Maximum Lloyd iterations per restart.
const KMEANS_MAX_ITER: usize = 100;

/// A node in the hierarchical cluster tree.
///
/// Leaf cluster nodes hold chunk identifiers directly; internal cluster
/// nodes hold children (sub-clusters). Every node also keeps the full set of
/// chunk identifiers under it.
#[derive(Debug, Clone)]
pub struct ClusterNode {
    /// All chunk identifiers under this cluster.
    pub chunk_ids: Vec<String>,
    /// Embeddings aligned with `chunk_ids`.
    pub embeddings: Vec<Vec<f32>>,
    /// Sub-clusters. Empty for leaf clusters.
    pub children: Vec<ClusterNode>,
}

impl ClusterNode {
    /// Whether this cluster was not split further.
    pub fn is_leaf_cluster(&self) -> bool {
        self.children.is_empty()
    }
}

/// Top-down k-ary clustering that preserves hierarchical structure.
///
/// At each level, splits into `min(branching, N)` clusters with k-means and
/// recurses into each non-empty cluster with `max_depth - 1`. Terminates
/// without splitting for singleton inputs, zero remaining depth, or
/// `N <= branching`. A level that produced only one non-empty cluster is
/// collapsed rather than adding useless depth.
///
/// # Errors
///
/// - `InvalidParameter` for an empty input or `branching == 0`.
/// - `DimensionMismatch` when `embeddings` and `chunk_ids` disagree in length.
pub fn hierarchical_kmeans(
    embeddings: &[Vec<f32>],
    chunk_ids: &[String],
    branching: usize,
    max_depth: usize,
) -> Result<ClusterNode, HcrError> {
    if chunk_ids.is_empty() {
        return Err(HcrError::InvalidParameter(
            "cannot cluster an empty corpus".to_string(),
        ));
    }
    if branching == 0 {
        return Err(HcrError::InvalidParameter(
            "branching must be positive".to_string(),
        ));
    }
    if embeddings.len() != chunk_ids.len() {
        return Err(HcrError::DimensionMismatch {
            expected: chunk_ids.len(),
            actual: embeddings.len(),
        });
    }
    Ok(split_recursive(embeddings, chunk_ids, branching, max_depth))
}

fn split_recursive(
    embeddings: &[Vec<f32>],
    chunk_ids: &[String],
    branching: usize,
    max_depth: usize,
) -> ClusterNode {
    let mut root = ClusterNode {
        chunk_ids: chunk_ids.to_vec(),
        embeddings: embeddings.to_vec(),
        children: Vec::new(),
    };

    let n = chunk_ids.len();
    if n <= 1 || max_depth == 0 || n <= branching {
        return root;
    }

    let k = branching.min(n);
    let labels = kmeans_best(embeddings, k);

    for label in 0..k {
        let member_rows: Vec<usize> = (0..n).filter(|&i| labels[i] == label).collect();
        if member_rows.is_empty() {
            continue;
        }
        let child_ids: Vec<String> = member_rows.iter().map(|&i| chunk_ids[i].clone()).collect();
        let child_embs: Vec<Vec<f32>> =
            member_rows.iter().map(|&i| embeddings[i].clone()).collect();
        root.children.push(split_recursive(
            &child_embs,
            &child_ids,
            branching,
            max_depth - 1,
        ));
    }

    // A single non-empty cluster is no split at all
    if root.children.len() <= 1 {
        root.children.clear();
    }

    root
}

/// Run `KMEANS_N_INIT` restarts and return the lowest-inertia assignment.
fn kmeans_best(embeddings: &[Vec<f32>], k: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut best_labels = vec![0; embeddings.len()];
    let mut best_inertia = f32::INFINITY;

    for _ in 0..KMEANS_N_INIT {
        let (labels, inertia) = kmeans_once(embeddings, k, &mut rng);
        if inertia < best_inertia {
            best_inertia = inertia;
            best_labels = labels;
        }
    }

    best_labels
}

/// One k-means run: k-means++ init, then Lloyd iterations with early stop.
fn kmeans_once(embeddings: &[Vec<f32>], k: usize, rng: &mut StdRng) -> (Vec<usize>, f32) {
    let n = embeddings.len();
    let mut centers = kmeans_plus_plus_init(embeddings, k, rng);
    let mut labels = vec![0usize; n];

    for _iteration in 0..KMEANS_MAX_ITER {
        let mut changed = false;
        for (i, point) in embeddings.iter().enumerate() {
            let mut best_cluster = 0;
            let mut best_dist = f32::INFINITY;
            for (cluster, center) in centers.iter().enumerate() {
                let dist = squared_distance(point, center);
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = cluster;
                }
            }
            if labels[i] != best_cluster {
                labels[i] = best_cluster;
                changed = true;
            }
        }

        update_centers(embeddings, &labels, &mut centers);

        if !changed {
            break;
        }
    }

    let inertia = embeddings
        .iter()
        .zip(labels.iter())
        .map(|(point, &label)| squared_distance(point, &centers[label]))
        .sum();

    (labels, inertia)
}

/// k-means++ initialization: spread initial centers by distance-weighted sampling.
fn kmeans_plus_plus_init(embeddings: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = embeddings.len();
    let mut centers = Vec::with_capacity(k);
    centers.push(embeddings[rng.gen_range(0..n)].clone());

    while centers.len() < k {
        let weights: Vec<f32> = embeddings
            .iter()
            .map(|point| {
                centers
                    .iter()
                    .map(|center| squared_distance(point, center))
                    .fold(f32::INFINITY, f32::min)
            })
            .collect();
        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            // All points coincide with existing centers
            centers.push(embeddings[rng.gen_range(0..n)].clone());
            continue;
        }
        let mut threshold = rng.gen::<f32>() * total;
        let mut selected = n - 1;
        for (i, &w) in weights.iter().enumerate() {
            threshold -= w;
            if threshold <= 0.0 {
                selected = i;
                break;
            }
        }
        centers.push(embeddings[selected].clone());
    }

    centers
}

fn update_centers(embeddings: &[Vec<f32>], labels: &[usize], centers: &mut [Vec<f32>]) {
    let k = centers.len();
    let dim = centers.first().map_or(0, Vec::len);
    let mut counts = vec![0usize; k];
    let mut sums = vec![vec![0.0f32; dim]; k];

    for (point, &label) in embeddings.iter().zip(labels.iter()) {
        counts[label] += 1;
        for (j, &value) in point.iter().enumerate() {
            sums[label][j] += value;
        }
    }

    for (cluster, count) in counts.iter().enumerate() {
        // Empty clusters keep their previous center
        if *count > 0 {
            for j in 0..dim {
                centers[cluster][j] = sums[cluster][j] / *count as f32;
            }
        }
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
