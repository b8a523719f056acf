use thiserror::Error;

/// Errors that can occur while loading data, fitting or evaluating a model.
#[derive(Debug, Error)]
pub enum CanopyError {
    /// The CSV reader failed (I/O or malformed quoting).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A record did not have the expected number of fields.
    #[error("record {record}: expected {expected} fields, found {found}")]
    FieldCount {
        /// 1-based record number.
        record: usize,
        /// Number of columns in the schema.
        expected: usize,
        /// Number of fields actually present.
        found: usize,
    },

    /// A field could not be parsed as a finite number.
    #[error("record {record}, column {column:?}: invalid number {value:?}")]
    InvalidNumber {
        /// 1-based record number.
        record: usize,
        /// Column name from the schema.
        column: String,
        /// Raw field text.
        value: String,
    },

    /// A label value was not an integer class index the schema allows.
    #[error("record {record}: invalid class label {value}")]
    InvalidLabel {
        /// 1-based record number.
        record: usize,
        /// Offending value.
        value: f64,
    },

    /// The dataset contains no rows.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Train/test split parameters cannot be satisfied.
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// Inputs with mismatched lengths or widths.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The model was used before `fit`.
    #[error("model is not fitted")]
    NotFitted,

    /// Invalid hyperparameters.
    #[error("invalid parameter: {0}")]
    InvalidParams(String),

    /// Model (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Canopy core operations.
pub type Result<T> = std::result::Result<T, CanopyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = CanopyError::EmptyDataset;
        assert_eq!(err.to_string(), "dataset is empty");

        let err = CanopyError::FieldCount {
            record: 3,
            expected: 9,
            found: 8,
        };
        assert_eq!(err.to_string(), "record 3: expected 9 fields, found 8");

        let err = CanopyError::InvalidNumber {
            record: 1,
            column: "Glucose".into(),
            value: "abc".into(),
        };
        assert!(err.to_string().contains("Glucose"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CanopyError>();
    }
}
