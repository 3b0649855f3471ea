//! Mock ClusterClient for unit testing
//!
//! This module provides an in-memory implementation of ClusterClientTrait that can
//! be used in unit tests without requiring a running API server.
//!
//! The mock is organized into:
//! - `store.rs` - generic create/replace/delete bookkeeping shared by all kinds
//! - `docling.rs` - DoclingServe test setup, status patches and cascading deletion
//! - `defaults.rs` - field defaulting applied on every create and replace

mod defaults;
mod docling;
mod store;

use crate::error::ClusterError;
use crate::kind::ResourceKind;
use crate::cluster_trait::ClusterClientTrait;
use crds::{DoclingServe, DoclingServeStatus, Route, RouteStatus};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::api::core::v1::{Service, ServiceAccount, ServiceStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// (namespace, name)
pub(crate) type ObjectKey = (String, String);

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Failure returned instead of performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Behave as if another writer won the resourceVersion race
    Conflict,
    /// Any other API server rejection
    Api(String),
}

impl InjectedFailure {
    fn to_error(&self, kind: ResourceKind, operation: &str) -> ClusterError {
        match self {
            Self::Conflict => ClusterError::Conflict(format!(
                "injected conflict on {} {}",
                operation, kind
            )),
            Self::Api(message) => ClusterError::Api(format!("{} {}: {}", operation, kind, message)),
        }
    }
}

/// Mock ClusterClient for testing
///
/// Stores objects in memory per kind. Clones share the same store, so a test
/// can keep a handle while the reconciler owns another.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    pub(crate) docling_serves: Arc<Mutex<HashMap<ObjectKey, DoclingServe>>>,
    pub(crate) service_accounts: Arc<Mutex<HashMap<ObjectKey, ServiceAccount>>>,
    pub(crate) deployments: Arc<Mutex<HashMap<ObjectKey, Deployment>>>,
    pub(crate) services: Arc<Mutex<HashMap<ObjectKey, Service>>>,
    pub(crate) routes: Arc<Mutex<HashMap<ObjectKey, Route>>>,
    read_failures: Arc<Mutex<HashMap<ResourceKind, InjectedFailure>>>,
    write_failures: Arc<Mutex<HashMap<ResourceKind, InjectedFailure>>>,
    mutations: Arc<Mutex<HashMap<ResourceKind, usize>>>,
    // Counter for uids and resourceVersions
    next_version: Arc<Mutex<u64>>,
}

impl MockClusterClient {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read of `kind` fail until cleared
    pub fn fail_reads(&self, kind: ResourceKind, failure: InjectedFailure) {
        lock(&self.read_failures).insert(kind, failure);
    }

    /// Make every create/replace/delete/status write of `kind` fail until cleared
    pub fn fail_writes(&self, kind: ResourceKind, failure: InjectedFailure) {
        lock(&self.write_failures).insert(kind, failure);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        lock(&self.read_failures).clear();
        lock(&self.write_failures).clear();
    }

    /// Successful writes made through the trait for `kind`
    pub fn mutation_count(&self, kind: ResourceKind) -> usize {
        lock(&self.mutations).get(&kind).copied().unwrap_or(0)
    }

    /// Successful writes to managed sub-resources (everything but DoclingServe)
    pub fn sub_resource_mutations(&self) -> usize {
        lock(&self.mutations)
            .iter()
            .filter(|(kind, _)| **kind != ResourceKind::DoclingServe)
            .map(|(_, count)| count)
            .sum()
    }

    /// Stored ServiceAccount, if any
    pub fn service_account(&self, namespace: &str, name: &str) -> Option<ServiceAccount> {
        store::get(&self.service_accounts, ResourceKind::ServiceAccount, namespace, name).ok()
    }

    /// Stored Deployment, if any
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        store::get(&self.deployments, ResourceKind::Deployment, namespace, name).ok()
    }

    /// Stored Service, if any
    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        store::get(&self.services, ResourceKind::Service, namespace, name).ok()
    }

    /// Stored Route, if any
    pub fn route(&self, namespace: &str, name: &str) -> Option<Route> {
        store::get(&self.routes, ResourceKind::Route, namespace, name).ok()
    }

    /// Report Deployment status as the deployment controller would
    pub fn set_deployment_status(&self, namespace: &str, name: &str, status: DeploymentStatus) {
        let version = self.next_version();
        if let Some(deployment) = lock(&self.deployments).get_mut(&(namespace.to_string(), name.to_string())) {
            deployment.status = Some(status);
            deployment.metadata.resource_version = Some(version.to_string());
        }
    }

    /// Report Service status as the service controller would
    pub fn set_service_status(&self, namespace: &str, name: &str, status: ServiceStatus) {
        let version = self.next_version();
        if let Some(service) = lock(&self.services).get_mut(&(namespace.to_string(), name.to_string())) {
            service.status = Some(status);
            service.metadata.resource_version = Some(version.to_string());
        }
    }

    /// Report Route status as the router would
    pub fn set_route_status(&self, namespace: &str, name: &str, status: RouteStatus) {
        let version = self.next_version();
        if let Some(route) = lock(&self.routes).get_mut(&(namespace.to_string(), name.to_string())) {
            route.status = Some(status);
            route.metadata.resource_version = Some(version.to_string());
        }
    }

    /// Edit a Deployment out-of-band, as a user with kubectl would.
    /// Bumps the resourceVersion; not counted as an operator write.
    pub fn edit_deployment(&self, namespace: &str, name: &str, edit: impl FnOnce(&mut Deployment)) {
        let version = self.next_version();
        if let Some(deployment) = lock(&self.deployments).get_mut(&(namespace.to_string(), name.to_string())) {
            edit(deployment);
            deployment.metadata.resource_version = Some(version.to_string());
        }
    }

    pub(crate) fn next_version(&self) -> u64 {
        let mut version = lock(&self.next_version);
        *version += 1;
        *version
    }

    pub(crate) fn check_read(&self, kind: ResourceKind) -> Result<(), ClusterError> {
        match lock(&self.read_failures).get(&kind) {
            Some(failure) => Err(failure.to_error(kind, "get")),
            None => Ok(()),
        }
    }

    pub(crate) fn check_write(&self, kind: ResourceKind, operation: &str) -> Result<(), ClusterError> {
        match lock(&self.write_failures).get(&kind) {
            Some(failure) => Err(failure.to_error(kind, operation)),
            None => Ok(()),
        }
    }

    pub(crate) fn record_mutation(&self, kind: ResourceKind) {
        *lock(&self.mutations).entry(kind).or_insert(0) += 1;
    }

    fn create_with<K: kube::Resource + Clone>(
        &self,
        objects: &Mutex<HashMap<ObjectKey, K>>,
        kind: ResourceKind,
        namespace: &str,
        obj: &K,
    ) -> Result<K, ClusterError> {
        self.check_write(kind, "create")?;
        let version = self.next_version();
        let created = store::create(objects, kind, namespace, obj, format!("uid-{}", version), version.to_string())?;
        self.record_mutation(kind);
        Ok(created)
    }

    fn replace_with<K: kube::Resource + Clone>(
        &self,
        objects: &Mutex<HashMap<ObjectKey, K>>,
        kind: ResourceKind,
        namespace: &str,
        obj: &K,
        keep_status: fn(&K, &mut K),
    ) -> Result<K, ClusterError> {
        self.check_write(kind, "replace")?;
        let version = self.next_version();
        let replaced = store::replace(objects, kind, namespace, obj, version.to_string(), keep_status)?;
        self.record_mutation(kind);
        Ok(replaced)
    }
}

// The status subresource is ignored on spec writes and initialised to `{}` on
// create, matching what the API server returns for these kinds.
fn keep_service_account_status(_current: &ServiceAccount, _next: &mut ServiceAccount) {}

fn keep_deployment_status(current: &Deployment, next: &mut Deployment) {
    next.status.clone_from(&current.status);
}

fn keep_service_status(current: &Service, next: &mut Service) {
    next.status.clone_from(&current.status);
}

fn keep_route_status(current: &Route, next: &mut Route) {
    next.status.clone_from(&current.status);
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn get_docling_serve(&self, namespace: &str, name: &str) -> Result<DoclingServe, ClusterError> {
        self.check_read(ResourceKind::DoclingServe)?;
        store::get(&self.docling_serves, ResourceKind::DoclingServe, namespace, name)
    }

    async fn patch_docling_serve_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &DoclingServeStatus,
    ) -> Result<DoclingServe, ClusterError> {
        docling::patch_status(self, namespace, name, resource_version, status)
    }

    async fn get_service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccount, ClusterError> {
        self.check_read(ResourceKind::ServiceAccount)?;
        store::get(&self.service_accounts, ResourceKind::ServiceAccount, namespace, name)
    }

    async fn create_service_account(&self, namespace: &str, service_account: &ServiceAccount) -> Result<ServiceAccount, ClusterError> {
        self.create_with(&self.service_accounts, ResourceKind::ServiceAccount, namespace, service_account)
    }

    async fn replace_service_account(&self, namespace: &str, service_account: &ServiceAccount) -> Result<ServiceAccount, ClusterError> {
        self.replace_with(&self.service_accounts, ResourceKind::ServiceAccount, namespace, service_account, keep_service_account_status)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        self.check_read(ResourceKind::Deployment)?;
        store::get(&self.deployments, ResourceKind::Deployment, namespace, name)
    }

    async fn create_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError> {
        let mut deployment = deployment.clone();
        deployment.status = Some(DeploymentStatus::default());
        defaults::deployment(&mut deployment);
        self.create_with(&self.deployments, ResourceKind::Deployment, namespace, &deployment)
    }

    async fn replace_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError> {
        let mut deployment = deployment.clone();
        defaults::deployment(&mut deployment);
        self.replace_with(&self.deployments, ResourceKind::Deployment, namespace, &deployment, keep_deployment_status)
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        self.check_read(ResourceKind::Service)?;
        store::get(&self.services, ResourceKind::Service, namespace, name)
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> Result<Service, ClusterError> {
        let mut service = service.clone();
        service.status = Some(ServiceStatus::default());
        defaults::service(&mut service);
        self.create_with(&self.services, ResourceKind::Service, namespace, &service)
    }

    async fn replace_service(&self, namespace: &str, service: &Service) -> Result<Service, ClusterError> {
        let mut service = service.clone();
        defaults::service(&mut service);
        self.replace_with(&self.services, ResourceKind::Service, namespace, &service, keep_service_status)
    }

    async fn get_route(&self, namespace: &str, name: &str) -> Result<Route, ClusterError> {
        self.check_read(ResourceKind::Route)?;
        store::get(&self.routes, ResourceKind::Route, namespace, name)
    }

    async fn create_route(&self, namespace: &str, route: &Route) -> Result<Route, ClusterError> {
        let mut route = route.clone();
        route.status = Some(RouteStatus::default());
        defaults::route(&mut route, namespace);
        self.create_with(&self.routes, ResourceKind::Route, namespace, &route)
    }

    async fn replace_route(&self, namespace: &str, route: &Route) -> Result<Route, ClusterError> {
        let mut route = route.clone();
        defaults::route(&mut route, namespace);
        self.replace_with(&self.routes, ResourceKind::Route, namespace, &route, keep_route_status)
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.check_write(ResourceKind::Route, "delete")?;
        store::delete(&self.routes, ResourceKind::Route, namespace, name)?;
        self.record_mutation(ResourceKind::Route);
        Ok(())
    }
}
