//! An open tracking run and the logging calls made within it.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactStore, artifact_segments};
use crate::client::{TrackingClient, now_millis};
use crate::error::Result;
use crate::protocol::{
    Empty, KeyValue, LogBatchRequest, LogMetricRequest, LogModelRequest, RunInfo, RunStatus,
    UpdateRunRequest,
};

/// The server rejects batches with more params than this.
pub const MAX_PARAMS_PER_BATCH: usize = 100;

/// File name of the model descriptor inside a logged model directory.
pub const MLMODEL_FILE: &str = "MLmodel";

/// Descriptor written as `<artifact_path>/MLmodel`.
///
/// JSON is a subset of YAML, so this is readable by MLflow tooling.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub artifact_path: String,
    pub run_id: String,
    pub model_uuid: String,
    pub utc_time_created: String,
    pub flavors: serde_json::Value,
}

/// An open run. Close it with [`end`](ActiveRun::end).
#[derive(Debug)]
pub struct ActiveRun {
    client: TrackingClient,
    info: RunInfo,
    ended: bool,
}

impl ActiveRun {
    pub(crate) fn new(client: TrackingClient, info: RunInfo) -> Self {
        Self {
            client,
            info,
            ended: false,
        }
    }

    /// Run metadata as returned by the server at creation.
    #[must_use]
    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    /// Server-assigned run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.info.run_id
    }

    /// Logs string parameters, batched to respect the server limit.
    pub async fn log_params(&self, params: &[(String, String)]) -> Result<()> {
        for chunk in params.chunks(MAX_PARAMS_PER_BATCH) {
            let request = LogBatchRequest {
                run_id: self.run_id(),
                metrics: Vec::new(),
                params: chunk
                    .iter()
                    .map(|(k, v)| KeyValue::new(k.as_str(), v.as_str()))
                    .collect(),
                tags: Vec::new(),
            };
            let _: Empty = self.client.post("runs/log-batch", &request).await?;
        }
        debug!(run_id = self.run_id(), count = params.len(), "logged params");
        Ok(())
    }

    /// Logs a single metric value at step 0.
    pub async fn log_metric(&self, key: &str, value: f64) -> Result<()> {
        let request = LogMetricRequest {
            run_id: self.run_id(),
            key,
            value,
            timestamp: now_millis(),
            step: 0,
        };
        let _: Empty = self.client.post("runs/log-metric", &request).await?;
        debug!(run_id = self.run_id(), key, value, "logged metric");
        Ok(())
    }

    /// Stores `bytes` at `artifact_path` relative to the run's artifact root.
    pub async fn log_artifact_bytes(&self, artifact_path: &str, bytes: &[u8]) -> Result<()> {
        let segments = artifact_segments(artifact_path)?;
        match ArtifactStore::resolve(&self.info.artifact_uri, self.client.tracking_uri())? {
            ArtifactStore::Proxy(base) => {
                let url = ArtifactStore::proxy_url(&base, &segments)?;
                let request = self.client.http().put(url).body(bytes.to_vec());
                let _: Empty = self.client.send("mlflow-artifacts/artifacts", request).await?;
            }
            ArtifactStore::Local(root) => {
                ArtifactStore::write_local(&root, &segments, bytes).await?;
            }
        }
        debug!(run_id = self.run_id(), artifact_path, size = bytes.len(), "logged artifact");
        Ok(())
    }

    /// Logs a serialized model under `artifact_path`.
    ///
    /// Writes `<artifact_path>/<data_file>` and an `MLmodel` descriptor
    /// naming `flavor`, then records the model on the run.
    pub async fn log_model(
        &self,
        artifact_path: &str,
        flavor: &str,
        data_file: &str,
        model_bytes: &[u8],
    ) -> Result<ModelDescriptor> {
        let descriptor = ModelDescriptor {
            artifact_path: artifact_path.to_string(),
            run_id: self.run_id().to_string(),
            model_uuid: uuid::Uuid::new_v4().simple().to_string(),
            utc_time_created: chrono::Utc::now()
                .format("%Y-%m-%d %H:%M:%S%.6f")
                .to_string(),
            flavors: serde_json::json!({
                flavor: {
                    "data": data_file,
                    "serialization_format": "json",
                    "code": null,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        };

        let trimmed = artifact_path.trim_end_matches('/');
        self.log_artifact_bytes(&format!("{trimmed}/{data_file}"), model_bytes)
            .await?;
        let descriptor_json = serde_json::to_string_pretty(&descriptor)?;
        self.log_artifact_bytes(&format!("{trimmed}/{MLMODEL_FILE}"), descriptor_json.as_bytes())
            .await?;

        let request = LogModelRequest {
            run_id: self.run_id(),
            model_json: serde_json::to_string(&descriptor)?,
        };
        let _: Empty = self.client.post("runs/log-model", &request).await?;

        info!(run_id = self.run_id(), artifact_path, flavor, "logged model");
        Ok(descriptor)
    }

    /// Marks the run terminated with `status`.
    ///
    /// If the server rejects the update the run still counts as open.
    pub async fn end(mut self, status: RunStatus) -> Result<()> {
        self.close(status).await
    }

    async fn close(&mut self, status: RunStatus) -> Result<()> {
        let request = UpdateRunRequest {
            run_id: self.run_id(),
            status,
            end_time: now_millis(),
        };
        let _: Empty = self.client.post("runs/update", &request).await?;
        self.ended = true;
        info!(run_id = self.run_id(), %status, "ended run");
        Ok(())
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        if !self.ended {
            warn!(run_id = %self.info.run_id, "run dropped without being ended");
        }
    }
}
