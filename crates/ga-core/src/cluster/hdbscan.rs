//! HDBSCAN over a dense pairwise distance matrix.
//!
//! Steps:
//! 1. core distance = distance to the `min_samples`-th nearest neighbour,
//!    the point itself counted first;
//! 2. mutual reachability `max(core_a, core_b, d(a, b))`;
//! 3. minimum spanning tree by dense Prim's, starting at row 0;
//! 4. single-linkage hierarchy from the MST edges;
//! 5. condensed tree with `min_cluster_size`, lambda = 1 / distance;
//! 6. flat clusters by excess of mass or leaf selection;
//! 7. labels, with points outside every selected cluster as noise.
//!
//! O(N²·D) time and O(N²) memory. No randomness: ties resolve to the lowest
//! row index in Prim's and keep discovery order in the linkage sort.

use std::collections::VecDeque;

use ga_common::{Error, Result};
use ga_config::{ClusterSelectionMethod, ClusteringParams};
use ga_math::{pairwise_distances, DistanceMetric, Matrix};
use serde_json::{json, Map, Value};

use super::{ClusterAssignment, Clusterer};
use crate::logging::event_names;

/// HDBSCAN clusterer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hdbscan {
    pub metric: DistanceMetric,
    pub min_cluster_size: usize,
    pub min_samples: usize,
    pub selection: ClusterSelectionMethod,
    pub allow_single_cluster: bool,
}

impl Default for Hdbscan {
    fn default() -> Self {
        Hdbscan::from_params(DistanceMetric::default(), &ClusteringParams::default())
    }
}

impl Hdbscan {
    pub fn from_params(metric: DistanceMetric, params: &ClusteringParams) -> Self {
        Hdbscan {
            metric,
            min_cluster_size: params.min_cluster_size,
            min_samples: params.effective_min_samples(),
            selection: params.cluster_selection_method,
            allow_single_cluster: params.allow_single_cluster,
        }
    }

    /// Cluster `features`, which must be finite.
    pub fn fit(&self, features: &Matrix) -> ClusterAssignment {
        let n = features.rows();
        let min_cluster_size = self.min_cluster_size.max(2);

        if n < 2 || n < min_cluster_size {
            return degenerate(n, min_cluster_size);
        }

        let distances = pairwise_distances(features, self.metric);
        if all_distances_zero(&distances) {
            return degenerate(n, min_cluster_size);
        }

        let core = core_distances(&distances, self.min_samples.max(1));
        let mst = prim_mst(&distances, &core);
        let linkage = single_linkage(mst, n);
        let tree = condense(&linkage, n, min_cluster_size);
        let selected = match self.selection {
            ClusterSelectionMethod::Eom => select_eom(&tree, self.allow_single_cluster),
            ClusterSelectionMethod::Leaf => select_leaves(&tree, self.allow_single_cluster),
        };
        label_points(&tree, &selected, n)
    }
}

impl Clusterer for Hdbscan {
    fn name(&self) -> &'static str {
        "HDBSCAN"
    }

    fn metric(&self) -> Option<DistanceMetric> {
        Some(self.metric)
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("min_cluster_size".into(), json!(self.min_cluster_size));
        params.insert("min_samples".into(), json!(self.min_samples));
        params.insert(
            "cluster_selection_method".into(),
            json!(self.selection.as_str()),
        );
        params.insert(
            "allow_single_cluster".into(),
            json!(self.allow_single_cluster),
        );
        params
    }

    fn cluster(&self, features: Option<&Matrix>) -> Result<ClusterAssignment> {
        let features = features.ok_or_else(|| Error::MissingInput {
            name: "features".to_string(),
        })?;
        for (row, values) in features.iter_rows().enumerate() {
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(Error::NonFiniteFeature { row, col });
            }
        }
        Ok(self.fit(features))
    }
}

fn degenerate(n: usize, min_cluster_size: usize) -> ClusterAssignment {
    tracing::debug!(
        target: event_names::CLUSTER_DEGENERATE,
        n_examples = n,
        min_cluster_size,
        "degenerate input, returning a single cluster"
    );
    ClusterAssignment::single_cluster(n)
}

/// Every point sits at distance 0 from every other under the metric.
fn all_distances_zero(distances: &Matrix) -> bool {
    distances.as_slice().iter().all(|d| *d == 0.0)
}

/// Distance to the k-th nearest neighbour, the point itself first.
fn core_distances(distances: &Matrix, k: usize) -> Vec<f64> {
    let n = distances.rows();
    let idx = k.min(n) - 1;
    let mut scratch = Vec::with_capacity(n);
    (0..n)
        .map(|i| {
            scratch.clear();
            scratch.extend_from_slice(distances.row(i));
            let (_, kth, _) = scratch.select_nth_unstable_by(idx, f64::total_cmp);
            *kth
        })
        .collect()
}

/// An MST edge; `weight` is a mutual reachability distance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

/// Dense Prim's on the implicit mutual reachability graph.
fn prim_mst(distances: &Matrix, core: &[f64]) -> Vec<Edge> {
    let n = core.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    for _ in 1..n {
        in_tree[current] = true;
        let mut next = None;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = distances.get(current, j).max(core[current]).max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                from[j] = current;
            }
            // Strict comparison keeps the lowest index on ties.
            if next.is_none() || best[j] < next_weight {
                next = Some(j);
                next_weight = best[j];
            }
        }
        let Some(j) = next else { break };
        edges.push(Edge {
            a: from[j],
            b: j,
            weight: best[j],
        });
        current = j;
    }
    edges
}

/// Internal node `n + i` of the single-linkage dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

/// Build the dendrogram by merging MST edges in weight order.
fn single_linkage(mut edges: Vec<Edge>, n: usize) -> Vec<Merge> {
    // sort_by is stable, so equal weights keep Prim discovery order.
    edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));

    let mut parent: Vec<usize> = (0..2 * n - 1).collect();
    let mut size = vec![1usize; 2 * n - 1];
    let mut merges = Vec::with_capacity(n - 1);

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for (i, edge) in edges.iter().enumerate() {
        let ra = find(&mut parent, edge.a);
        let rb = find(&mut parent, edge.b);
        let node = n + i;
        parent[ra] = node;
        parent[rb] = node;
        size[node] = size[ra] + size[rb];
        merges.push(Merge {
            left: ra,
            right: rb,
            distance: edge.weight,
            size: size[node],
        });
    }
    merges
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Cluster(usize),
    Point(usize),
}

/// A row of the condensed tree: `child` leaves `parent` at `lambda`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CondensedEdge {
    parent: usize,
    child: Child,
    lambda: f64,
    size: usize,
}

/// Condensed cluster tree. Cluster 0 is the root; children always have
/// larger indices than their parent.
#[derive(Debug, Clone)]
struct CondensedTree {
    edges: Vec<CondensedEdge>,
    n_clusters: usize,
}

impl CondensedTree {
    fn cluster_parents(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.n_clusters];
        for edge in &self.edges {
            if let Child::Cluster(c) = edge.child {
                parents[c] = Some(edge.parent);
            }
        }
        parents
    }

    fn cluster_children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.n_clusters];
        for edge in &self.edges {
            if let Child::Cluster(c) = edge.child {
                children[edge.parent].push(c);
            }
        }
        children
    }

    /// Sum of `(lambda - birth) * size` over each cluster's outgoing edges.
    fn stabilities(&self) -> Vec<f64> {
        let mut birth = vec![0.0; self.n_clusters];
        for edge in &self.edges {
            if let Child::Cluster(c) = edge.child {
                birth[c] = edge.lambda;
            }
        }
        let mut stability = vec![0.0; self.n_clusters];
        for edge in &self.edges {
            stability[edge.parent] += (edge.lambda - birth[edge.parent]) * edge.size as f64;
        }
        stability
    }
}

fn condense(merges: &[Merge], n: usize, min_cluster_size: usize) -> CondensedTree {
    let root = 2 * n - 2;
    let size_of = |node: usize| if node < n { 1 } else { merges[node - n].size };

    let mut relabel = vec![0usize; 2 * n - 1];
    let mut n_clusters = 1;
    let mut edges = Vec::new();
    let mut queue = VecDeque::from([root]);

    let fall_out = |node: usize, parent: usize, lambda: f64, edges: &mut Vec<CondensedEdge>| {
        let mut stack = vec![node];
        while let Some(x) = stack.pop() {
            if x < n {
                edges.push(CondensedEdge {
                    parent,
                    child: Child::Point(x),
                    lambda,
                    size: 1,
                });
            } else {
                let merge = &merges[x - n];
                stack.push(merge.right);
                stack.push(merge.left);
            }
        }
    };

    while let Some(node) = queue.pop_front() {
        if node < n {
            continue;
        }
        let merge = merges[node - n];
        let lambda = 1.0 / merge.distance.max(f64::MIN_POSITIVE);
        let parent = relabel[node];
        let left_big = size_of(merge.left) >= min_cluster_size;
        let right_big = size_of(merge.right) >= min_cluster_size;

        match (left_big, right_big) {
            (true, true) => {
                for child in [merge.left, merge.right] {
                    relabel[child] = n_clusters;
                    edges.push(CondensedEdge {
                        parent,
                        child: Child::Cluster(n_clusters),
                        lambda,
                        size: size_of(child),
                    });
                    n_clusters += 1;
                    queue.push_back(child);
                }
            }
            (false, false) => {
                fall_out(merge.left, parent, lambda, &mut edges);
                fall_out(merge.right, parent, lambda, &mut edges);
            }
            (false, true) => {
                fall_out(merge.left, parent, lambda, &mut edges);
                relabel[merge.right] = parent;
                queue.push_back(merge.right);
            }
            (true, false) => {
                fall_out(merge.right, parent, lambda, &mut edges);
                relabel[merge.left] = parent;
                queue.push_back(merge.left);
            }
        }
    }

    CondensedTree { edges, n_clusters }
}

/// Excess-of-mass selection. The root competes only with `allow_single_cluster`.
fn select_eom(tree: &CondensedTree, allow_single_cluster: bool) -> Vec<bool> {
    let children = tree.cluster_children();
    let mut stability = tree.stabilities();
    let first = if allow_single_cluster { 0 } else { 1 };

    let mut selected: Vec<bool> = (0..tree.n_clusters).map(|c| c >= first).collect();

    for c in (first..tree.n_clusters).rev() {
        let subtree: f64 = children[c].iter().map(|&ch| stability[ch]).sum();
        if subtree > stability[c] {
            selected[c] = false;
            stability[c] = subtree;
        } else {
            let mut stack = children[c].clone();
            while let Some(d) = stack.pop() {
                selected[d] = false;
                stack.extend_from_slice(&children[d]);
            }
        }
    }
    selected
}

/// Leaf selection: every cluster without cluster children.
fn select_leaves(tree: &CondensedTree, allow_single_cluster: bool) -> Vec<bool> {
    let children = tree.cluster_children();
    let mut selected: Vec<bool> = (0..tree.n_clusters)
        .map(|c| c != 0 && children[c].is_empty())
        .collect();
    if tree.n_clusters == 1 && allow_single_cluster {
        selected[0] = true;
    }
    selected
}

fn label_points(tree: &CondensedTree, selected: &[bool], n: usize) -> ClusterAssignment {
    if selected.first() == Some(&true) {
        return ClusterAssignment::single_cluster(n);
    }

    let mut label_of = vec![None; tree.n_clusters];
    for (label, cluster) in selected
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s)
        .map(|(c, _)| c)
        .enumerate()
    {
        label_of[cluster] = Some(label);
    }

    let parents = tree.cluster_parents();
    let mut labels = vec![None; n];
    for edge in &tree.edges {
        let Child::Point(point) = edge.child else {
            continue;
        };
        let mut cursor = Some(edge.parent);
        while let Some(c) = cursor {
            if let Some(label) = label_of[c] {
                labels[point] = Some(label);
                break;
            }
            cursor = parents[c];
        }
    }
    ClusterAssignment::new(labels)
}
