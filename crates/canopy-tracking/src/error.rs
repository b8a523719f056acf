use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the tracking server or its artifact store.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The tracking URI could not be parsed or uses an unsupported scheme.
    #[error("invalid tracking uri {uri:?}: {reason}")]
    InvalidUri {
        /// URI as given.
        uri: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Transport failure: connection refused, DNS, TLS, timeout.
    #[error("request to tracking server failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("tracking server returned {status} for {endpoint}: {code}: {message}")]
    Api {
        /// Endpoint that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Server error code such as `RESOURCE_DOES_NOT_EXIST`.
        code: String,
        /// Human readable message from the server.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        /// Endpoint that was called.
        endpoint: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The named experiment exists but has been deleted.
    #[error("experiment {name:?} is deleted; restore it or pick another name")]
    DeletedExperiment {
        /// Experiment name.
        name: String,
    },

    /// The run's artifact URI uses a scheme this client cannot write to.
    #[error("unsupported artifact uri {0:?}")]
    UnsupportedArtifactUri(String),

    /// An artifact path is absolute or escapes the run's artifact root.
    #[error("invalid artifact path {0:?}")]
    InvalidArtifactPath(String),

    /// Writing to a local artifact store failed.
    #[error("failed to write artifact {path:?}: {source}")]
    ArtifactIo {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TrackingError {
    /// Server error code, if this is an API error.
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

/// Result type alias for tracking operations.
pub type Result<T> = std::result::Result<T, TrackingError>;
