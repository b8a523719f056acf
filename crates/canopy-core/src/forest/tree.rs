//! CART decision tree with Gini impurity and per-node feature subsampling.

use oorandom::Rand64;
use serde::{Deserialize, Serialize};

use crate::dataset::FeatureMatrix;
use crate::dataset::split::shuffle;

/// A node of a fitted tree. Children are indices into the tree's node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probability distribution of the training samples in this leaf.
        proba: Vec<f64>,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    /// Number of candidate features drawn at each node.
    pub max_features: usize,
}

/// `max(1, floor(sqrt(n_features)))`.
#[must_use]
pub fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

/// Gini impurity of a class count vector.
#[must_use]
pub fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of samples going left after sorting on `feature`.
    n_left: usize,
    /// Weighted child impurity `(n_l * g_l + n_r * g_r) / n`.
    child_impurity: f64,
    left_impurity: f64,
    right_impurity: f64,
}

/// A fitted classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
    /// Raw weighted impurity decrease per feature.
    impurity_decrease: Vec<f64>,
}

struct Builder<'a> {
    x: &'a FeatureMatrix,
    y: &'a [u32],
    config: TreeConfig,
    n_classes: usize,
    n_total: f64,
    rng: Rand64,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
}

impl DecisionTree {
    /// Grows a tree on the rows of `x` listed in `sample` (duplicates allowed).
    pub fn fit(
        x: &FeatureMatrix,
        y: &[u32],
        sample: &[usize],
        n_classes: usize,
        config: TreeConfig,
        seed: u64,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            config,
            n_classes,
            n_total: sample.len() as f64,
            rng: Rand64::new(u128::from(seed)),
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; x.n_cols()],
        };
        let mut indices = sample.to_vec();
        builder.grow(&mut indices, 0);

        Self {
            nodes: builder.nodes,
            n_features: x.n_cols(),
            n_classes,
            impurity_decrease: builder.impurity_decrease,
        }
    }

    /// Number of nodes (splits + leaves).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Class distribution of the leaf reached by `row`.
    #[must_use]
    pub fn predict_proba_row(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Impurity decrease per feature, normalized to sum to 1.
    ///
    /// Returns `None` when the tree never split.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(self.impurity_decrease.iter().map(|v| v / total).collect())
    }

    /// Number of classes seen at fit time.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

impl Builder<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.y[i] as usize] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let proba = counts.iter().map(|&c| c as f64 / n as f64).collect();
        self.nodes.push(Node::Leaf { proba });
        self.nodes.len() - 1
    }

    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let counts = self.class_counts(indices);
        let impurity = gini(&counts, n);

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < 2 || impurity <= 0.0 {
            return self.leaf(&counts, n);
        }

        let Some(best) = self.find_split(indices, &counts, impurity) else {
            return self.leaf(&counts, n);
        };

        let x = self.x;
        indices.sort_by(|&a, &b| x.get(a, best.feature).total_cmp(&x.get(b, best.feature)));

        let n_left = best.n_left;
        let n_right = n - n_left;
        self.impurity_decrease[best.feature] += (n as f64 / self.n_total)
            * (impurity
                - (n_left as f64 / n as f64) * best.left_impurity
                - (n_right as f64 / n as f64) * best.right_impurity);

        let idx = self.nodes.len();
        self.nodes.push(Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: 0,
            right: 0,
        });

        let (left_idx, right_idx) = indices.split_at_mut(n_left);
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);

        if let Node::Split {
            left: l, right: r, ..
        } = &mut self.nodes[idx]
        {
            *l = left;
            *r = right;
        }
        idx
    }

    /// Searches a random subset of features for the lowest weighted child impurity.
    ///
    /// Features that are constant on this node do not count toward `max_features`.
    fn find_split(
        &mut self,
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let mut features: Vec<usize> = (0..self.x.n_cols()).collect();
        shuffle(&mut features, &mut self.rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0usize;
        let mut sorted = indices.to_vec();

        for &feature in &features {
            if visited >= self.config.max_features && best.is_some() {
                break;
            }

            let x = self.x;
            sorted.sort_by(|&a, &b| x.get(a, feature).total_cmp(&x.get(b, feature)));

            let lo = x.get(sorted[0], feature);
            let hi = x.get(sorted[n - 1], feature);
            if lo == hi {
                continue;
            }
            visited += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.to_vec();

            for pos in 1..n {
                let prev = sorted[pos - 1];
                let class = self.y[prev] as usize;
                left[class] += 1;
                right[class] -= 1;

                let a = x.get(prev, feature);
                let b = x.get(sorted[pos], feature);
                if a == b {
                    continue;
                }

                let gl = gini(&left, pos);
                let gr = gini(&right, n - pos);
                let child = (pos as f64 * gl + (n - pos) as f64 * gr) / n as f64;

                if best.is_none_or(|cur| child < cur.child_impurity) {
                    let mut threshold = a + (b - a) / 2.0;
                    if threshold >= b {
                        threshold = a;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        n_left: pos,
                        child_impurity: child,
                        left_impurity: gl,
                        right_impurity: gr,
                    });
                }
            }
        }

        best.filter(|b| b.child_impurity < parent_impurity)
    }
}
