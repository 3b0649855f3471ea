//! Controller-specific error types.
//!
//! This module defines error types specific to the docling operator
//! that are not covered by the cluster client's errors.

use cluster_client::ClusterError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the docling operator.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Cluster store read or write failed
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Kubernetes client setup error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Object lacks metadata the operation depends on
    #[error("Object is missing {0}")]
    MissingObjectKey(&'static str),

    /// Reconciliation failed
    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    /// Whether the failure is an optimistic-concurrency collision.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Cluster(e) if e.is_conflict())
    }
}
