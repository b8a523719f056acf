//! Artifact destinations derived from a run's `artifact_uri`.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::error::{Result, TrackingError};

/// Where a run's artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStore {
    /// Proxied through the tracking server's `mlflow-artifacts` service.
    /// Holds the full URL of the run's artifact root on that service.
    Proxy(Url),
    /// A directory on the local filesystem.
    Local(PathBuf),
}

/// Splits a relative artifact path into validated segments.
///
/// Absolute paths, empty paths and `..` components are rejected.
pub fn artifact_segments(path: &str) -> Result<Vec<&str>> {
    let invalid = || TrackingError::InvalidArtifactPath(path.to_string());
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(invalid());
    }
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.is_empty() || segments.contains(&"..") {
        return Err(invalid());
    }
    Ok(segments)
}

impl ArtifactStore {
    /// Resolves a run's `artifact_uri` against the tracking server URL.
    ///
    /// `mlflow-artifacts:/<path>` maps to
    /// `<tracking>/api/2.0/mlflow-artifacts/artifacts/<path>`; an explicit
    /// host in the URI replaces the tracking host. `file://` URIs and bare
    /// paths map to a local directory.
    pub fn resolve(artifact_uri: &str, tracking: &Url) -> Result<Self> {
        let unsupported = || TrackingError::UnsupportedArtifactUri(artifact_uri.to_string());

        let parsed = match Url::parse(artifact_uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(Self::Local(PathBuf::from(artifact_uri)));
            }
            Err(_) => return Err(unsupported()),
        };

        match parsed.scheme() {
            "mlflow-artifacts" => {
                let mut base = tracking.clone();
                if let Some(host) = parsed.host_str() {
                    base.set_host(Some(host)).map_err(|_| unsupported())?;
                    base.set_port(parsed.port()).map_err(|_| unsupported())?;
                }
                {
                    let mut segments = base.path_segments_mut().map_err(|_| unsupported())?;
                    segments
                        .pop_if_empty()
                        .extend(["api", "2.0", "mlflow-artifacts", "artifacts"]);
                    segments.extend(parsed.path().split('/').filter(|s| !s.is_empty()));
                }
                Ok(Self::Proxy(base))
            }
            "file" => parsed
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| unsupported()),
            // Single-letter schemes are Windows drive letters.
            scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(artifact_uri))),
            _ => Err(unsupported()),
        }
    }

    /// Full URL for an artifact on a proxied store.
    pub fn proxy_url(base: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| TrackingError::UnsupportedArtifactUri(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Writes `bytes` to `<root>/<segments>` on the local filesystem.
    pub async fn write_local(root: &Path, segments: &[&str], bytes: &[u8]) -> Result<PathBuf> {
        let path = segments.iter().fold(root.to_path_buf(), |p, s| p.join(s));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TrackingError::ArtifactIo {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| TrackingError::ArtifactIo {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), size = bytes.len(), "artifact written locally");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracking() -> Url {
        Url::parse("http://localhost:5000").unwrap()
    }

    #[test]
    fn resolves_proxied_uri() {
        let store =
            ArtifactStore::resolve("mlflow-artifacts:/1/abc/artifacts", &tracking()).unwrap();
        let expected =
            Url::parse("http://localhost:5000/api/2.0/mlflow-artifacts/artifacts/1/abc/artifacts")
                .unwrap();
        assert_eq!(store, ArtifactStore::Proxy(expected));
    }

    #[test]
    fn proxied_uri_with_host_overrides_tracking_host() {
        let uri = "mlflow-artifacts://artifacts.internal:8080/7/r/artifacts";
        let store = ArtifactStore::resolve(uri, &tracking()).unwrap();
        match store {
            ArtifactStore::Proxy(url) => {
                assert_eq!(url.host_str(), Some("artifacts.internal"));
                assert_eq!(url.port(), Some(8080));
                assert!(url.path().ends_with("/artifacts/7/r/artifacts"));
            }
            other => panic!("unexpected store {other:?}"),
        }
    }

    #[test]
    fn resolves_local_paths() {
        assert_eq!(
            ArtifactStore::resolve("/tmp/mlruns/1/abc/artifacts", &tracking()).unwrap(),
            ArtifactStore::Local(PathBuf::from("/tmp/mlruns/1/abc/artifacts"))
        );
        assert_eq!(
            ArtifactStore::resolve("file:///tmp/mlruns/1/abc/artifacts", &tracking()).unwrap(),
            ArtifactStore::Local(PathBuf::from("/tmp/mlruns/1/abc/artifacts"))
        );
        assert_eq!(
            ArtifactStore::resolve("mlruns/1/abc/artifacts", &tracking()).unwrap(),
            ArtifactStore::Local(PathBuf::from("mlruns/1/abc/artifacts"))
        );
    }

    #[test]
    fn rejects_remote_object_stores() {
        assert!(matches!(
            ArtifactStore::resolve("s3://bucket/1/abc/artifacts", &tracking()),
            Err(TrackingError::UnsupportedArtifactUri(_))
        ));
    }

    #[test]
    fn validates_artifact_paths() {
        assert_eq!(
            artifact_segments("random_forest_model/MLmodel").unwrap(),
            vec!["random_forest_model", "MLmodel"]
        );
        assert_eq!(artifact_segments("./a//b").unwrap(), vec!["a", "b"]);
        assert!(artifact_segments("/etc/passwd").is_err());
        assert!(artifact_segments("a/../../b").is_err());
        assert!(artifact_segments("").is_err());
    }

    #[test]
    fn proxy_url_appends_segments() {
        let base = Url::parse("http://h/api/2.0/mlflow-artifacts/artifacts/1/r/artifacts").unwrap();
        let url = ArtifactStore::proxy_url(&base, &["model", "MLmodel"]).unwrap();
        assert_eq!(url.path(), "/api/2.0/mlflow-artifacts/artifacts/1/r/artifacts/model/MLmodel");
    }

    #[tokio::test]
    async fn writes_local_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = ArtifactStore::write_local(dir.path(), &["model", "model.json"], b"{}")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("model").join("model.json"));
        assert_eq!(std::fs::read(path).unwrap(), b"{}");
    }
}
