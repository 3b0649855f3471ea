//! DoclingServe CRD
//!
//! Declares a docling-serve document-processing workload: the API server
//! image and scale, exactly one execution engine, and optional external exposure.

use crate::condition::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group shared by the operator's own resources
pub const DOCLING_API_GROUP: &str = "docling.github.io";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "docling.github.io",
    version = "v1alpha1",
    kind = "DoclingServe",
    plural = "doclingserves",
    namespaced,
    status = "DoclingServeStatus",
    printcolumn = r#"{"name":"Image","type":"string","jsonPath":".spec.apiServer.image"}"#,
    printcolumn = r#"{"name":"Instances","type":"integer","jsonPath":".spec.apiServer.instances"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DoclingServeSpec {
    /// docling-serve API server workload
    pub api_server: ApiServer,

    /// Compute engine running the asynchronous conversion jobs
    pub engine: Engine,

    /// External exposure through an OpenShift Route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteExposure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiServer {
    /// docling-serve container image to deploy
    pub image: String,

    /// Run the docling-serve UI
    #[serde(default, rename = "enableUI")]
    pub enable_ui: bool,

    /// Desired number of docling-serve pods
    #[serde(default = "default_instances")]
    pub instances: i32,

    /// ConfigMap injected wholesale into the container environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_name: Option<String>,
}

fn default_instances() -> i32 {
    1
}

/// Exactly one of `local` or `kfp` must be set.
///
/// The rule is enforced at admission time through the CEL validation below,
/// so reconciliation treats the two as independent optional contributions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
#[schemars(extend("x-kubernetes-validations" = [{
    "rule": "(has(self.local) && !has(self.kfp)) || (!has(self.local) && has(self.kfp))",
    "message": "Only a Local or KFP Engine are allowed to be configured not both"
}]))]
pub struct Engine {
    /// In-process engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalEngine>,

    /// Kubeflow Pipelines engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kfp: Option<KfpEngine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalEngine {
    /// Number of workers processing incoming tasks
    #[serde(default = "default_num_workers")]
    pub num_workers: i32,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
        }
    }
}

fn default_num_workers() -> i32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KfpEngine {
    /// Kubeflow Pipeline endpoint, e.g. `https://NAME.NAMESPACE.svc.cluster.local:8888`
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteExposure {
    /// Create a Route exposing the API outside the cluster
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DoclingServeStatus {
    /// Latest observations of the managed resources, at most one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Generation last observed by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl DoclingServeSpec {
    /// Whether the Route feature is switched on. An absent `route` block means off.
    pub fn route_enabled(&self) -> bool {
        self.route.as_ref().is_some_and(|r| r.enabled)
    }
}
