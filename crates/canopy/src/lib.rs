//! # Canopy
//!
//! Umbrella crate re-exporting the Canopy workspace:
//!
//! - [`engine`]: dataset loading, random forest, metrics
//! - [`tracking`]: MLflow-compatible tracking client
//! - [`trainer`]: the fetch / fit / evaluate / log pipeline

pub use canopy_core as engine;
pub use canopy_tracking as tracking;
pub use canopy_trainer as trainer;

pub use canopy_core::{
    CanopyError, Dataset, FeatureImportance, ForestParams, RandomForestClassifier, Schema,
    accuracy_score, train_test_split,
};
pub use canopy_tracking::{ActiveRun, RunStatus, TrackingClient, TrackingError};
pub use canopy_trainer::{TrainConfig, TrainingReport, render_summary, run_training};
