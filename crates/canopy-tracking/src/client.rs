//! HTTP client for an MLflow-compatible tracking server.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, TrackingError};
use crate::protocol::{
    ApiErrorBody, CreateExperimentRequest, CreateExperimentResponse, CreateRunRequest,
    CreateRunResponse, Experiment, GetExperimentResponse, KeyValue,
};
use crate::run::ActiveRun;

/// Tracking server used when none is configured.
pub const DEFAULT_TRACKING_URI: &str = "http://localhost:5000";

/// Error code returned when a resource is missing.
pub const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";
/// Error code returned when creating a resource that already exists.
pub const RESOURCE_ALREADY_EXISTS: &str = "RESOURCE_ALREADY_EXISTS";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Handle to a tracking server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TrackingClient {
    http: reqwest::Client,
    base: Url,
}

impl TrackingClient {
    /// Creates a client for the server at `tracking_uri` (`http` or `https`).
    pub fn new(tracking_uri: &str) -> Result<Self> {
        let base = Url::parse(tracking_uri).map_err(|e| TrackingError::InvalidUri {
            uri: tracking_uri.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(TrackingError::InvalidUri {
                uri: tracking_uri.to_string(),
                reason: format!("scheme {:?} is not supported, use http or https", base.scheme()),
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("canopy-tracking/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, base })
    }

    /// The tracking server URL.
    #[must_use]
    pub fn tracking_uri(&self) -> &Url {
        &self.base
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn api_url(&self, endpoint: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TrackingError::InvalidUri {
                uri: self.base.to_string(),
                reason: "cannot be used as a base url".into(),
            })?
            .pop_if_empty()
            .extend(["api", "2.0", "mlflow"])
            .extend(endpoint.split('/'));
        Ok(url)
    }

    pub(crate) async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::POST, endpoint)?.json(body);
        self.send(endpoint, request).await
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<R> {
        let request = self.request(Method::GET, endpoint)?.query(query);
        self.send(endpoint, request).await
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        Ok(self.http.request(method, self.api_url(endpoint)?))
    }

    pub(crate) async fn send<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<R> {
        debug!(endpoint, "tracking request");
        let response = request.send().await?;
        decode_response(endpoint, response).await
    }

    /// Looks up an experiment by name; `Ok(None)` if it does not exist.
    pub async fn get_experiment_by_name(&self, name: &str) -> Result<Option<Experiment>> {
        let response: Result<GetExperimentResponse> = self
            .get("experiments/get-by-name", &[("experiment_name", name)])
            .await;
        match response {
            Ok(body) => Ok(Some(body.experiment)),
            Err(e) if e.api_code() == Some(RESOURCE_DOES_NOT_EXIST) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates an experiment and returns its id.
    pub async fn create_experiment(&self, name: &str) -> Result<String> {
        let body: CreateExperimentResponse = self
            .post("experiments/create", &CreateExperimentRequest { name })
            .await?;
        info!(experiment = name, id = %body.experiment_id, "created experiment");
        Ok(body.experiment_id)
    }

    /// Returns the named experiment, creating it if needed.
    ///
    /// Fails if the experiment exists but was deleted.
    pub async fn set_experiment(&self, name: &str) -> Result<Experiment> {
        if let Some(experiment) = self.get_experiment_by_name(name).await? {
            if experiment.is_deleted() {
                return Err(TrackingError::DeletedExperiment {
                    name: name.to_string(),
                });
            }
            debug!(experiment = name, id = %experiment.experiment_id, "using existing experiment");
            return Ok(experiment);
        }

        match self.create_experiment(name).await {
            Ok(experiment_id) => Ok(Experiment {
                experiment_id,
                name: name.to_string(),
                artifact_location: String::new(),
                lifecycle_stage: "active".to_string(),
            }),
            // Another client created it between our lookup and create.
            Err(e) if e.api_code() == Some(RESOURCE_ALREADY_EXISTS) => self
                .get_experiment_by_name(name)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }

    /// Starts a run in `experiment_id` with the default source tags.
    pub async fn start_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
    ) -> Result<ActiveRun> {
        let request = CreateRunRequest {
            experiment_id,
            start_time: now_millis(),
            run_name,
            tags: default_run_tags(),
        };
        let body: CreateRunResponse = self.post("runs/create", &request).await?;
        info!(run_id = %body.run.info.run_id, experiment_id, "started run");
        Ok(ActiveRun::new(self.clone(), body.run.info))
    }
}

async fn decode_response<R: DeserializeOwned>(endpoint: &str, response: Response) -> Result<R> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = if body.message.is_empty() {
            text.trim().to_string()
        } else {
            body.message
        };
        let code = if body.error_code.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_string()
        } else {
            body.error_code
        };
        return Err(TrackingError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            code,
            message,
        });
    }

    let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
    serde_json::from_str(text).map_err(|source| TrackingError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `mlflow.user`, `mlflow.source.name` and `mlflow.source.type` for this process.
pub fn default_run_tags() -> Vec<KeyValue> {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let source = std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    vec![
        KeyValue::new("mlflow.user", user),
        KeyValue::new("mlflow.source.name", source),
        KeyValue::new("mlflow.source.type", "LOCAL"),
    ]
}
