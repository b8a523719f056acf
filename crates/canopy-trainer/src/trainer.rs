//! End-to-end training run: fetch, split, fit, evaluate, log.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use canopy_core::forest::{ForestParams, RandomForestClassifier};
use canopy_core::metrics::{FeatureImportance, accuracy_score};
use canopy_tracking::{ActiveRun, RunStatus, TrackingClient};

use crate::config::TrainConfig;
use crate::data::{PreparedData, load_dataset, prepare};

/// Flavor name recorded in the model descriptor.
pub const MODEL_FLAVOR: &str = "canopy_forest";
/// File holding the serialized forest inside the model artifact directory.
pub const MODEL_DATA_FILE: &str = "model.json";
/// Metric key for test-set accuracy.
pub const ACCURACY_METRIC: &str = "accuracy";

/// Outcome of a successful training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub experiment_id: String,
    pub run_id: String,
    pub accuracy: f64,
    pub params: Vec<(String, String)>,
    pub importances: FeatureImportance,
    pub n_train: usize,
    pub n_test: usize,
}

/// What the in-run steps produce before the run is closed.
struct RunOutcome {
    accuracy: f64,
    params: Vec<(String, String)>,
    importances: FeatureImportance,
}

/// Fits a forest on the training split and scores it on the test split.
pub fn fit_and_evaluate(
    params: ForestParams,
    data: &PreparedData,
) -> Result<(RandomForestClassifier, f64)> {
    let mut model = RandomForestClassifier::new(params);
    model
        .fit(&data.x_train, &data.y_train)
        .context("model fit failed")?;

    let y_pred = model.predict(&data.x_test)?;
    let accuracy = accuracy_score(&data.y_test, &y_pred)?;
    info!(accuracy, "model evaluated");
    Ok((model, accuracy))
}

async fn train_and_log(
    run: &ActiveRun,
    config: &TrainConfig,
    data: &PreparedData,
) -> Result<RunOutcome> {
    let forest_params = config.forest_params();
    let (model, accuracy) = fit_and_evaluate(forest_params, data)?;

    let params = forest_params.to_param_map();
    run.log_params(&params)
        .await
        .context("failed to log parameters")?;
    run.log_metric(ACCURACY_METRIC, accuracy)
        .await
        .context("failed to log accuracy")?;

    let model_json = model.to_json()?;
    run.log_model(
        &config.artifact_path,
        MODEL_FLAVOR,
        MODEL_DATA_FILE,
        model_json.as_bytes(),
    )
    .await
    .context("failed to log model")?;

    let importances = FeatureImportance::new(&data.feature_names, &model.feature_importances()?)?;

    Ok(RunOutcome {
        accuracy,
        params,
        importances,
    })
}

/// Runs the whole pipeline against the configured tracking server.
///
/// The run is ended `FINISHED` on success. Any error after the run has
/// started ends it `FAILED` and is then returned.
pub async fn run_training(config: &TrainConfig) -> Result<TrainingReport> {
    let client = TrackingClient::new(&config.tracking_uri)?;
    let experiment = client
        .set_experiment(&config.experiment)
        .await
        .with_context(|| {
            format!(
                "failed to set experiment {:?} on {}",
                config.experiment, config.tracking_uri
            )
        })?;

    let dataset = load_dataset(&config.dataset_url).await?;
    let data = prepare(&dataset, config.test_size, config.random_state)?;

    let run = client
        .start_run(&experiment.experiment_id, config.run_name.as_deref())
        .await
        .context("failed to start run")?;
    let run_id = run.run_id().to_string();

    match train_and_log(&run, config, &data).await {
        Ok(outcome) => {
            run.end(RunStatus::Finished)
                .await
                .context("failed to end run")?;
            info!(%run_id, accuracy = outcome.accuracy, "training run finished");
            Ok(TrainingReport {
                experiment_id: experiment.experiment_id,
                run_id,
                accuracy: outcome.accuracy,
                params: outcome.params,
                importances: outcome.importances,
                n_train: data.n_train(),
                n_test: data.n_test(),
            })
        }
        Err(e) => {
            if let Err(end_err) = run.end(RunStatus::Failed).await {
                warn!(%run_id, error = %end_err, "failed to mark run as failed");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::dataset::{Dataset, Schema};

    #[test]
    fn fit_and_evaluate_scores_in_unit_interval() {
        let text = include_str!("../tests/fixtures/diabetes_sample.csv");
        let dataset = Dataset::from_csv_str(text, Schema::pima()).unwrap();
        let data = prepare(&dataset, 0.2, 42).unwrap();

        let params = ForestParams::default().with_n_estimators(10);
        let (model, accuracy) = fit_and_evaluate(params, &data).unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
        assert_eq!(model.trees().len(), 10);
    }
}
