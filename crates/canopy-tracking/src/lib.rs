//! # Canopy Tracking
//!
//! Minimal client for MLflow-compatible experiment tracking servers.
//! Covers the calls a training job needs: resolving an experiment by name,
//! opening a run, logging params, metrics and artifacts, recording a model,
//! and closing the run with a terminal status.
//!
//! Artifacts go through the server's `mlflow-artifacts` proxy or into a
//! local directory, depending on the run's artifact URI.
pub mod artifacts;
pub mod client;
pub mod error;
pub mod protocol;
pub mod run;

pub use artifacts::ArtifactStore;
pub use client::{DEFAULT_TRACKING_URI, TrackingClient};
pub use error::{Result, TrackingError};
pub use protocol::{Experiment, KeyValue, RunInfo, RunStatus};
pub use run::{ActiveRun, ModelDescriptor};
