//! Request and response bodies of the MLflow REST API (`/api/2.0/mlflow`).

use serde::{Deserialize, Serialize};

/// Lifecycle stage reported for deleted experiments and runs.
pub const LIFECYCLE_DELETED: &str = "deleted";

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

/// Response to calls that return nothing of interest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Empty {}

/// An experiment as described by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    #[serde(default)]
    pub artifact_location: String,
    #[serde(default)]
    pub lifecycle_stage: String,
}

impl Experiment {
    /// Returns `true` if the experiment was soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.lifecycle_stage == LIFECYCLE_DELETED
    }
}

#[derive(Debug, Deserialize)]
pub struct GetExperimentResponse {
    pub experiment: Experiment,
}

#[derive(Debug, Serialize)]
pub struct CreateExperimentRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateExperimentResponse {
    pub experiment_id: String,
}

/// A key/value pair used for params and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest<'a> {
    pub experiment_id: &'a str,
    pub start_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_name: Option<&'a str>,
    pub tags: Vec<KeyValue>,
}

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment_id: String,
    #[serde(default)]
    pub run_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub artifact_uri: String,
    #[serde(default)]
    pub lifecycle_stage: String,
}

#[derive(Debug, Deserialize)]
pub struct Run {
    pub info: RunInfo,
}

#[derive(Debug, Deserialize)]
pub struct CreateRunResponse {
    pub run: Run,
}

/// A single metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    pub value: f64,
    pub timestamp: i64,
    pub step: i64,
}

#[derive(Debug, Serialize)]
pub struct LogMetricRequest<'a> {
    pub run_id: &'a str,
    pub key: &'a str,
    pub value: f64,
    pub timestamp: i64,
    pub step: i64,
}

#[derive(Debug, Serialize)]
pub struct LogBatchRequest<'a> {
    pub run_id: &'a str,
    pub metrics: Vec<Metric>,
    pub params: Vec<KeyValue>,
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
pub struct LogModelRequest<'a> {
    pub run_id: &'a str,
    pub model_json: String,
}

/// Terminal (or running) state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
    Killed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateRunRequest<'a> {
    pub run_id: &'a str,
    pub status: RunStatus,
    pub end_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Finished).unwrap(),
            "\"FINISHED\""
        );
        assert_eq!(RunStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn run_info_tolerates_missing_fields() {
        let info: RunInfo =
            serde_json::from_str(r#"{"run_id":"abc","experiment_id":"1","extra":true}"#).unwrap();
        assert_eq!(info.run_id, "abc");
        assert!(info.artifact_uri.is_empty());
    }

    #[test]
    fn create_run_omits_missing_name() {
        let req = CreateRunRequest {
            experiment_id: "1",
            start_time: 5,
            run_name: None,
            tags: vec![KeyValue::new("mlflow.user", "me")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("run_name").is_none());
        assert_eq!(json["tags"][0]["key"], "mlflow.user");
    }
}
