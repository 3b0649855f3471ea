//! ClusterClient trait for mocking
//!
//! This trait abstracts the Kubernetes API calls the reconcilers make so they
//! can run against an in-memory store in unit tests.
//! The concrete KubeClusterClient implements this trait over `kube::Client`.

use crate::error::ClusterError;
use crds::{DoclingServe, DoclingServeStatus, Route};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};

/// Trait for cluster store operations
///
/// Reads return `ClusterError::NotFound` for missing objects. `replace_*`
/// sends the object's `metadata.resourceVersion` and fails with
/// `ClusterError::Conflict` when the stored version has moved on.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    // DoclingServe
    async fn get_docling_serve(&self, namespace: &str, name: &str) -> Result<DoclingServe, ClusterError>;
    async fn patch_docling_serve_status(&self, namespace: &str, name: &str, resource_version: Option<&str>, status: &DoclingServeStatus) -> Result<DoclingServe, ClusterError>;

    // ServiceAccounts
    async fn get_service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccount, ClusterError>;
    async fn create_service_account(&self, namespace: &str, service_account: &ServiceAccount) -> Result<ServiceAccount, ClusterError>;
    async fn replace_service_account(&self, namespace: &str, service_account: &ServiceAccount) -> Result<ServiceAccount, ClusterError>;

    // Deployments
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError>;
    async fn create_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError>;
    async fn replace_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError>;

    // Services
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError>;
    async fn create_service(&self, namespace: &str, service: &Service) -> Result<Service, ClusterError>;
    async fn replace_service(&self, namespace: &str, service: &Service) -> Result<Service, ClusterError>;

    // Routes
    async fn get_route(&self, namespace: &str, name: &str) -> Result<Route, ClusterError>;
    async fn create_route(&self, namespace: &str, route: &Route) -> Result<Route, ClusterError>;
    async fn replace_route(&self, namespace: &str, route: &Route) -> Result<Route, ClusterError>;
    async fn delete_route(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
}
