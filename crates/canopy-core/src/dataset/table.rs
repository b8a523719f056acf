//! In-memory numeric table loaded from a headerless CSV.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::schema::Schema;
use crate::error::{CanopyError, Result};

/// Dense row-major matrix of feature values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Builds a matrix from row-major data.
    pub fn from_row_major(data: Vec<f64>, n_cols: usize) -> Result<Self> {
        if n_cols == 0 {
            return Err(CanopyError::ShapeMismatch(
                "matrix must have at least one column".into(),
            ));
        }
        if data.len() % n_cols != 0 {
            return Err(CanopyError::ShapeMismatch(format!(
                "{} values do not fill rows of width {n_cols}",
                data.len()
            )));
        }
        let n_rows = data.len() / n_cols;
        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    /// Builds a matrix from a slice of rows; all rows must share a width.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(CanopyError::ShapeMismatch(format!(
                    "row {i} has {} values, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_row_major(data, n_cols)
    }

    /// Number of rows (samples).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (features).
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Borrow row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// Value at (`row`, `col`).
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_cols)
    }

    /// Gathers the given rows into a new matrix, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            data,
            n_rows: indices.len(),
            n_cols: self.n_cols,
        }
    }
}

/// A parsed dataset: every record holds all feature values plus the label.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    features: FeatureMatrix,
    labels: Vec<f64>,
}

impl Dataset {
    /// Parses a headerless CSV whose columns follow `schema`.
    ///
    /// Blank lines are skipped. Every other record must have exactly
    /// `schema.width()` fields, each a finite number.
    pub fn from_csv_reader<R: Read>(reader: R, schema: Schema) -> Result<Self> {
        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let width = schema.width();
        let n_features = schema.n_features();
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let number = idx + 1;

            if record.len() != width {
                return Err(CanopyError::FieldCount {
                    record: number,
                    expected: width,
                    found: record.len(),
                });
            }

            for (col, field) in record.iter().enumerate() {
                let value = field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CanopyError::InvalidNumber {
                        record: number,
                        column: schema.column_name(col).to_string(),
                        value: field.to_string(),
                    })?;
                if col < n_features {
                    data.push(value);
                } else {
                    labels.push(value);
                }
            }
        }

        if labels.is_empty() {
            return Err(CanopyError::EmptyDataset);
        }

        let features = FeatureMatrix::from_row_major(data, n_features)?;
        debug!(rows = labels.len(), cols = width, "parsed csv dataset");

        Ok(Self {
            schema,
            features,
            labels,
        })
    }

    /// Parses a dataset from CSV text.
    pub fn from_csv_str(text: &str, schema: Schema) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes(), schema)
    }

    /// Column layout of this dataset.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Names of the feature columns.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.schema.features
    }

    /// Drops the label column, returning features and class labels.
    ///
    /// Every label must be an integer in `0..schema.n_classes`.
    pub fn features_and_target(&self) -> Result<(FeatureMatrix, Vec<u32>)> {
        let n_classes = f64::from(self.schema.n_classes);
        let target = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if v >= 0.0 && v.fract() == 0.0 && v < n_classes {
                    Ok(v as u32)
                } else {
                    Err(CanopyError::InvalidLabel {
                        record: i + 1,
                        value: v,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((self.features.clone(), target))
    }
}
