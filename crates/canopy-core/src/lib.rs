//! # Canopy Core
//!
//! Tabular data handling and model fitting for the Canopy trainer: a
//! headerless CSV loader with a fixed schema, seeded train/test splitting,
//! a random forest classifier with impurity-based feature importances,
//! and accuracy scoring.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_core::dataset::{Dataset, Schema, train_test_split};
//! use canopy_core::forest::{ForestParams, RandomForestClassifier};
//! use canopy_core::metrics::accuracy_score;
//!
//! let csv = "1,85,66,29,0,26.6,0.351,31,0\n\
//!            8,183,64,0,0,23.3,0.672,32,1\n\
//!            1,89,66,23,94,28.1,0.167,21,0\n\
//!            0,137,40,35,168,43.1,2.288,33,1\n\
//!            5,116,74,0,0,25.6,0.201,30,0\n";
//! let dataset = Dataset::from_csv_str(csv, Schema::pima()).unwrap();
//! let (x, y) = dataset.features_and_target().unwrap();
//! let split = train_test_split(x.n_rows(), 0.2, 42).unwrap();
//!
//! let mut model = RandomForestClassifier::new(ForestParams::default().with_n_estimators(10));
//! let y_train: Vec<u32> = split.train.iter().map(|&i| y[i]).collect();
//! model.fit(&x.select(&split.train), &y_train).unwrap();
//!
//! let y_test: Vec<u32> = split.test.iter().map(|&i| y[i]).collect();
//! let y_pred = model.predict(&x.select(&split.test)).unwrap();
//! let accuracy = accuracy_score(&y_test, &y_pred).unwrap();
//! assert!((0.0..=1.0).contains(&accuracy));
//! ```
pub mod dataset;
pub mod error;
pub mod forest;
pub mod metrics;

// Re-export primary API
pub use dataset::{Dataset, FeatureMatrix, Schema, Split, train_test_split};
pub use error::{CanopyError, Result};
pub use forest::{DecisionTree, ForestParams, RandomForestClassifier};
pub use metrics::{FeatureImportance, RankedFeature, accuracy_score};
