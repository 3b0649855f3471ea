//! Cluster client errors

use thiserror::Error;

/// Errors returned by the Kubernetes API server, classified the way the
/// reconcilers need to branch on them.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency collision (HTTP 409); the caller should re-read and retry
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other API server rejection
    #[error("Kubernetes API error: {0}")]
    Api(String),

    /// Transport, auth or client-side failure
    #[error("Kubernetes client error: {0}")]
    Kube(kube::Error),

    /// Patch body could not be built
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClusterError {
    /// Whether the object was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether a write lost an optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => Self::NotFound(response.message.clone()),
            kube::Error::Api(ref response) if response.code == 409 => Self::Conflict(response.message.clone()),
            kube::Error::Api(ref response) => Self::Api(format!("{} ({})", response.message, response.code)),
            other => Self::Kube(other),
        }
    }
}
