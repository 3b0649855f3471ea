//! Kubernetes API client
//!
//! Implements `ClusterClientTrait` over `kube::Client` with one typed `Api`
//! per call, scoped to the namespace of the object being reconciled.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crds::{DoclingServe, DoclingServeStatus, Route};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Cluster client backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the in-cluster or kubeconfig defaults
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        debug!("GET {} {}/{}", K::kind(&K::DynamicType::default()), namespace, name);
        Ok(self.api::<K>(namespace).get(name).await?)
    }

    async fn create<K>(&self, namespace: &str, obj: &K) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        K::DynamicType: Default,
    {
        debug!("CREATE {} {}/{}", K::kind(&K::DynamicType::default()), namespace, object_name(obj));
        Ok(self.api::<K>(namespace).create(&PostParams::default(), obj).await?)
    }

    async fn replace<K>(&self, namespace: &str, obj: &K) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        K::DynamicType: Default,
    {
        let name = object_name(obj);
        debug!("REPLACE {} {}/{}", K::kind(&K::DynamicType::default()), namespace, name);
        Ok(self.api::<K>(namespace).replace(name, &PostParams::default(), obj).await?)
    }
}

fn object_name<K: Resource>(obj: &K) -> &str {
    obj.meta().name.as_deref().unwrap_or_default()
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn get_docling_serve(&self, namespace: &str, name: &str) -> Result<DoclingServe, ClusterError> {
        self.get(namespace, name).await
    }

    async fn patch_docling_serve_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &DoclingServeStatus,
    ) -> Result<DoclingServe, ClusterError> {
        // resourceVersion in the patch body is a precondition: the API server
        // answers 409 if the object changed since it was read.
        let mut status_patch = serde_json::json!({
            "status": serde_json::to_value(status)?
        });
        if let Some(rv) = resource_version {
            status_patch["metadata"] = serde_json::json!({ "resourceVersion": rv });
        }

        let pp = PatchParams::default();
        Ok(self
            .api::<DoclingServe>(namespace)
            .patch_status(name, &pp, &Patch::Merge(&status_patch))
            .await?)
    }

    async fn get_service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccount, ClusterError> {
        self.get(namespace, name).await
    }

    async fn create_service_account(&self, namespace: &str, service_account: &ServiceAccount) -> Result<ServiceAccount, ClusterError> {
        self.create(namespace, service_account).await
    }

    async fn replace_service_account(&self, namespace: &str, service_account: &ServiceAccount) -> Result<ServiceAccount, ClusterError> {
        self.replace(namespace, service_account).await
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        self.get(namespace, name).await
    }

    async fn create_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError> {
        self.create(namespace, deployment).await
    }

    async fn replace_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError> {
        self.replace(namespace, deployment).await
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        self.get(namespace, name).await
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> Result<Service, ClusterError> {
        self.create(namespace, service).await
    }

    async fn replace_service(&self, namespace: &str, service: &Service) -> Result<Service, ClusterError> {
        self.replace(namespace, service).await
    }

    async fn get_route(&self, namespace: &str, name: &str) -> Result<Route, ClusterError> {
        self.get(namespace, name).await
    }

    async fn create_route(&self, namespace: &str, route: &Route) -> Result<Route, ClusterError> {
        self.create(namespace, route).await
    }

    async fn replace_route(&self, namespace: &str, route: &Route) -> Result<Route, ClusterError> {
        self.replace(namespace, route).await
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        debug!("DELETE Route {}/{}", namespace, name);
        self.api::<Route>(namespace)
            .delete(name, &DeleteParams::background())
            .await?;
        Ok(())
    }
}
