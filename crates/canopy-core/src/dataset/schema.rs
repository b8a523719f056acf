use serde::{Deserialize, Serialize};

/// Column names of the Pima Indians diabetes dataset, label last.
pub const PIMA_FEATURES: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Label column of the Pima Indians diabetes dataset.
pub const PIMA_LABEL: &str = "Outcome";

/// Class count of a binary label (`0` or `1`).
pub const BINARY_CLASSES: u32 = 2;

/// Column layout of a headerless CSV: feature columns followed by one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Feature column names, in file order.
    pub features: Vec<String>,
    /// Label column name (always the last column in the file).
    pub label: String,
    /// Labels must lie in `0..n_classes`.
    pub n_classes: u32,
}

impl Schema {
    /// Creates a schema from feature names and a binary label name.
    #[must_use]
    pub fn new<I, S>(features: I, label: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            label: label.into(),
            n_classes: BINARY_CLASSES,
        }
    }

    /// Overrides the number of label classes.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: u32) -> Self {
        self.n_classes = n_classes;
        self
    }

    /// The fixed 8-feature + `Outcome` layout of the diabetes dataset.
    #[must_use]
    pub fn pima() -> Self {
        Self::new(PIMA_FEATURES, PIMA_LABEL)
    }

    /// Number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Total number of columns in a record (features + label).
    #[must_use]
    pub fn width(&self) -> usize {
        self.features.len() + 1
    }

    /// Name of the column at `idx` in file order.
    #[must_use]
    pub fn column_name(&self, idx: usize) -> &str {
        self.features
            .get(idx)
            .map(String::as_str)
            .unwrap_or(self.label.as_str())
    }
}
