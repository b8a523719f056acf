//! Bagged ensemble of CART trees.

use oorandom::Rand64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::params::ForestParams;
use super::tree::{DecisionTree, TreeConfig, sqrt_features};
use crate::dataset::FeatureMatrix;
use crate::error::{CanopyError, Result};

/// Random forest classifier: bootstrap samples, `sqrt(n_features)` candidates
/// per split, predictions averaged over trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    /// Creates an unfitted forest.
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    /// Hyperparameters this forest was built with.
    #[must_use]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fitted trees (empty before `fit`).
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Returns `true` once `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Number of classes seen during `fit`.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Trains the ensemble. Refitting discards previous trees.
    pub fn fit(&mut self, x: &FeatureMatrix, y: &[u32]) -> Result<()> {
        self.params.validate()?;
        if x.n_rows() == 0 {
            return Err(CanopyError::EmptyDataset);
        }
        if x.n_rows() != y.len() {
            return Err(CanopyError::ShapeMismatch(format!(
                "{} feature rows but {} labels",
                x.n_rows(),
                y.len()
            )));
        }

        let n_classes = y.iter().copied().max().map_or(0, |m| m as usize + 1);
        let config = TreeConfig {
            max_depth: self.params.max_depth,
            max_features: sqrt_features(x.n_cols()),
        };

        let n = x.n_rows();
        let mut rng = Rand64::new(u128::from(self.params.random_state));
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut sample = vec![0usize; n];

        for _ in 0..self.params.n_estimators {
            let tree_seed = rng.rand_u64();
            for slot in sample.iter_mut() {
                *slot = rng.rand_range(0..n as u64) as usize;
            }
            trees.push(DecisionTree::fit(x, y, &sample, n_classes, config, tree_seed));
        }

        debug!(
            max_nodes = trees.iter().map(DecisionTree::node_count).max().unwrap_or(0),
            "forest trees grown"
        );
        info!(
            n_estimators = trees.len(),
            n_samples = n,
            n_features = x.n_cols(),
            n_classes,
            "random forest fitted"
        );

        self.trees = trees;
        self.n_features = x.n_cols();
        self.n_classes = n_classes;
        Ok(())
    }

    fn check_input(&self, x: &FeatureMatrix) -> Result<()> {
        if !self.is_fitted() {
            return Err(CanopyError::NotFitted);
        }
        if x.n_cols() != self.n_features {
            return Err(CanopyError::ShapeMismatch(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.n_cols()
            )));
        }
        Ok(())
    }

    /// Mean class distribution over all trees, one vector per row.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        self.check_input(x)?;
        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .map(|row| {
                let mut acc = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (a, p) in acc.iter_mut().zip(tree.predict_proba_row(row)) {
                        *a += p;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= n_trees);
                acc
            })
            .collect())
    }

    /// Most probable class per row; ties resolve to the lower class index.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u32>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|proba| argmax(proba) as u32)
            .collect())
    }

    /// Mean decrease in impurity per feature, summing to 1.
    ///
    /// Trees that never split are left out of the average. If no tree split
    /// at all the result is all zeros.
    pub fn feature_importances(&self) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(CanopyError::NotFitted);
        }
        let mut acc = vec![0.0; self.n_features];
        let mut contributing = 0usize;
        for imp in self.trees.iter().filter_map(DecisionTree::feature_importances) {
            for (a, v) in acc.iter_mut().zip(imp) {
                *a += v;
            }
            contributing += 1;
        }
        if contributing == 0 {
            return Ok(acc);
        }
        let total: f64 = acc.iter().sum();
        Ok(acc.into_iter().map(|v| v / total).collect())
    }

    /// Serializes the fitted model to JSON.
    pub fn to_json(&self) -> Result<String> {
        if !self.is_fitted() {
            return Err(CanopyError::NotFitted);
        }
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a model written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two classes separated along feature 0; the other features are noise.
    fn blobs(n_per_class: usize, n_features: usize) -> (FeatureMatrix, Vec<u32>) {
        let mut rng = Rand64::new(9);
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for class in 0..2u32 {
            for _ in 0..n_per_class {
                let row: Vec<f64> = (0..n_features)
                    .map(|f| {
                        let center = if class == 0 { 0.0 } else { 4.0 };
                        let noise = rng.rand_float() - 0.5;
                        if f == 0 { center + noise } else { noise * 8.0 }
                    })
                    .collect();
                rows.push(row);
                y.push(class);
            }
        }
        (FeatureMatrix::from_rows(&rows).unwrap(), y)
    }

    fn small_params() -> ForestParams {
        ForestParams::default().with_n_estimators(20)
    }

    #[test]
    fn learns_separable_blobs() {
        let (x, y) = blobs(40, 4);
        let mut forest = RandomForestClassifier::new(small_params());
        forest.fit(&x, &y).unwrap();

        let pred = forest.predict(&x).unwrap();
        let correct = pred.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.95);
    }

    #[test]
    fn importances_sum_to_one_and_favor_signal() {
        let (x, y) = blobs(40, 4);
        let mut forest = RandomForestClassifier::new(small_params());
        forest.fit(&x, &y).unwrap();

        let imp = forest.feature_importances().unwrap();
        assert_eq!(imp.len(), 4);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp.iter().all(|v| *v >= 0.0));
        let top = argmax(&imp);
        assert_eq!(top, 0);
    }

    #[test]
    fn probabilities_are_distributions() {
        let (x, y) = blobs(10, 3);
        let mut forest = RandomForestClassifier::new(small_params());
        forest.fit(&x, &y).unwrap();

        for p in forest.predict_proba(&x).unwrap() {
            assert_eq!(p.len(), 2);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn fitting_is_deterministic() {
        let (x, y) = blobs(15, 3);
        let mut a = RandomForestClassifier::new(small_params());
        let mut b = RandomForestClassifier::new(small_params());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.trees(), b.trees());
    }

    #[test]
    fn unfitted_model_errors() {
        let forest = RandomForestClassifier::new(ForestParams::default());
        let x = FeatureMatrix::from_rows(&[vec![1.0]]).unwrap();
        assert!(matches!(forest.predict(&x), Err(CanopyError::NotFitted)));
        assert!(matches!(
            forest.feature_importances(),
            Err(CanopyError::NotFitted)
        ));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let x = FeatureMatrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let mut forest = RandomForestClassifier::new(small_params());
        assert!(matches!(
            forest.fit(&x, &[0]),
            Err(CanopyError::ShapeMismatch(_))
        ));

        forest.fit(&x, &[0, 1]).unwrap();
        let wide = FeatureMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            forest.predict(&wide),
            Err(CanopyError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn single_class_gives_zero_importances() {
        let x = FeatureMatrix::from_rows(&[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let mut forest = RandomForestClassifier::new(small_params());
        forest.fit(&x, &[0, 0, 0]).unwrap();
        assert_eq!(forest.feature_importances().unwrap(), vec![0.0]);
        assert_eq!(forest.predict(&x).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let (x, y) = blobs(10, 2);
        let mut forest = RandomForestClassifier::new(small_params());
        forest.fit(&x, &y).unwrap();

        let restored = RandomForestClassifier::from_json(&forest.to_json().unwrap()).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), forest.predict(&x).unwrap());
    }

    #[test]
    fn argmax_prefers_lower_index_on_tie() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.8]), 1);
    }
}
