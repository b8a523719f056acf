//! # Canopy Trainer
//!
//! The training job: fetch the diabetes dataset, split it, fit a random
//! forest, score it on held-out rows, and record params, the accuracy metric
//! and the model artifact in an MLflow-compatible tracking server.

pub mod config;
pub mod data;
pub mod report;
pub mod trainer;

pub use config::TrainConfig;
pub use report::render_summary;
pub use trainer::{TrainingReport, run_training};
