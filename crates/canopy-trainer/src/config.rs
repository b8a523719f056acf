//! Trainer configuration from CLI flags and environment.

use clap::Parser;

use canopy_core::forest::ForestParams;
use canopy_core::forest::params::{DEFAULT_MAX_DEPTH, DEFAULT_N_ESTIMATORS, DEFAULT_RANDOM_STATE};
use canopy_tracking::DEFAULT_TRACKING_URI;

/// Pima Indians diabetes dataset (headerless CSV, 768 rows).
pub const DATASET_URL: &str =
    "https://raw.githubusercontent.com/jbrownlee/Datasets/master/pima-indians-diabetes.data.csv";

/// Experiment runs are recorded under.
pub const DEFAULT_EXPERIMENT: &str = "Resume_Project_Experiment";

/// Artifact directory the model is logged to.
pub const DEFAULT_ARTIFACT_PATH: &str = "random_forest_model";

/// Fraction of rows held out for evaluation.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// CLI arguments. With no flags and no environment overrides the trainer
/// fetches the diabetes dataset and logs to a local tracking server.
#[derive(Parser, Debug, Clone)]
#[command(name = "train")]
#[command(about = "Train a random forest and log the run to an MLflow tracking server")]
#[command(version)]
pub struct TrainConfig {
    /// Tracking server URI
    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value = DEFAULT_TRACKING_URI)]
    pub tracking_uri: String,

    /// Experiment name (created if missing)
    #[arg(long, env = "CANOPY_EXPERIMENT", default_value = DEFAULT_EXPERIMENT)]
    pub experiment: String,

    /// Dataset location: http(s) URL or local file path
    #[arg(long, env = "CANOPY_DATASET_URL", default_value = DATASET_URL)]
    pub dataset_url: String,

    /// Artifact directory for the logged model
    #[arg(long, default_value = DEFAULT_ARTIFACT_PATH)]
    pub artifact_path: String,

    /// Optional run name
    #[arg(long)]
    pub run_name: Option<String>,

    /// Number of trees
    #[arg(long, default_value_t = DEFAULT_N_ESTIMATORS)]
    pub n_estimators: usize,

    /// Maximum tree depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Seed for the forest and the train/test split
    #[arg(long, default_value_t = DEFAULT_RANDOM_STATE)]
    pub random_state: u64,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
    pub test_size: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            tracking_uri: DEFAULT_TRACKING_URI.to_string(),
            experiment: DEFAULT_EXPERIMENT.to_string(),
            dataset_url: DATASET_URL.to_string(),
            artifact_path: DEFAULT_ARTIFACT_PATH.to_string(),
            run_name: None,
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: DEFAULT_MAX_DEPTH,
            random_state: DEFAULT_RANDOM_STATE,
            test_size: DEFAULT_TEST_SIZE,
        }
    }
}

impl TrainConfig {
    /// Forest hyperparameters described by this configuration.
    #[must_use]
    pub fn forest_params(&self) -> ForestParams {
        ForestParams::default()
            .with_n_estimators(self.n_estimators)
            .with_max_depth(Some(self.max_depth))
            .with_random_state(self.random_state)
    }
}
