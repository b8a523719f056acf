//! Evaluation metrics and the feature-importance summary table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CanopyError, Result};

/// Fraction of predictions equal to the true labels, in `[0.0, 1.0]`.
pub fn accuracy_score(y_true: &[u32], y_pred: &[u32]) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(CanopyError::ShapeMismatch(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(CanopyError::EmptyDataset);
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// One row of the importance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub name: String,
    pub importance: f64,
}

/// Feature importances sorted from most to least important.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    rows: Vec<RankedFeature>,
}

impl FeatureImportance {
    /// Pairs names with scores and sorts descending. Equal scores keep input order.
    pub fn new(names: &[String], importances: &[f64]) -> Result<Self> {
        if names.len() != importances.len() {
            return Err(CanopyError::ShapeMismatch(format!(
                "{} feature names but {} importances",
                names.len(),
                importances.len()
            )));
        }
        let mut rows: Vec<RankedFeature> = names
            .iter()
            .zip(importances)
            .map(|(name, &importance)| RankedFeature {
                name: name.clone(),
                importance,
            })
            .collect();
        rows.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Ok(Self { rows })
    }

    /// Rows in descending order of importance.
    #[must_use]
    pub fn rows(&self) -> &[RankedFeature] {
        &self.rows
    }

    /// Sum of all importances.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.importance).sum()
    }

    /// The most important feature, if any.
    #[must_use]
    pub fn top(&self) -> Option<&RankedFeature> {
        self.rows.first()
    }
}

impl fmt::Display for FeatureImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HEADER: &str = "importance";
        let values: Vec<String> = self
            .rows
            .iter()
            .map(|r| format!("{:.6}", r.importance))
            .collect();
        let name_w = self.rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
        let value_w = values.iter().map(String::len).max().unwrap_or(0).max(HEADER.len());

        write!(f, "{:name_w$}  {HEADER:>value_w$}", "")?;
        for (row, value) in self.rows.iter().zip(&values) {
            write!(f, "\n{:<name_w$}  {value:>value_w$}", row.name)?;
        }
        Ok(())
    }
}
