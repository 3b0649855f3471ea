//! Deployment reconciler
//!
//! Runs the docling-serve API server as `<name>-deployment`. The managed pod
//! template fields are written from the DoclingServe spec on every pass; the
//! selector is only written when the Deployment is first created because it
//! is immutable.

use super::{PassContext, ReconcileResult, SubResourceReconciler};
use crate::error::ControllerError;
use crate::reconcile_helpers::{
    deployment_name, labels_for, namespace_of, plan_create_or_update, service_account_name,
    set_controller_reference, Applied, Plan,
};
use async_trait::async_trait;
use cluster_client::{ClusterClientTrait, ResourceKind};
use crds::DoclingServe;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, Container, ContainerPort, EnvFromSource, EnvVar, Probe,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::sync::Arc;

pub const CONTAINER_NAME: &str = "docling-serve";
pub const HTTP_PORT_NAME: &str = "http";
pub const HTTP_PORT: i32 = 5001;
const HEALTH_PATH: &str = "/health";

pub const ENV_ENABLE_UI: &str = "DOCLING_SERVE_ENABLE_UI";
pub const ENV_LOCAL_NUM_WORKERS: &str = "DOCLING_SERVE_ENG_LOC_NUM_WORKERS";
pub const ENV_KFP_ENDPOINT: &str = "DOCLING_SERVE_ENG_KFP_ENDPOINT";

pub struct DeploymentReconciler {
    client: Arc<dyn ClusterClientTrait>,
}

impl DeploymentReconciler {
    pub fn new(client: Arc<dyn ClusterClientTrait>) -> Self {
        Self { client }
    }

    async fn converge(&self, docling_serve: &DoclingServe) -> Result<Applied, ControllerError> {
        let namespace = namespace_of(docling_serve)?;
        let name = deployment_name(docling_serve);

        let plan = plan_create_or_update(
            self.client.get_deployment(&namespace, &name).await,
            || Deployment {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    namespace: Some(namespace.clone()),
                    ..Default::default()
                },
                ..Default::default()
            },
            |deployment| {
                apply_deployment_spec(deployment, docling_serve);
                set_controller_reference(docling_serve, deployment)
            },
        )?;

        let applied = Applied::from(&plan);
        match plan {
            Plan::Create(deployment) => {
                self.client.create_deployment(&namespace, &deployment).await?;
            }
            Plan::Update(deployment) => {
                self.client.replace_deployment(&namespace, &deployment).await?;
            }
            Plan::Unchanged(_) => {}
        }
        Ok(applied)
    }
}

/// Write the managed fields of the Deployment.
///
/// Fields the API server defaults (restart policy, probe timings, rollout
/// strategy and the like) are left as stored so a converged Deployment
/// compares equal to its desired state.
pub fn apply_deployment_spec(deployment: &mut Deployment, docling_serve: &DoclingServe) {
    let labels = labels_for(&docling_serve.name_any());
    let is_new = deployment.metadata.resource_version.is_none();
    deployment.metadata.labels = Some(labels.clone());

    let spec = deployment.spec.get_or_insert_with(Default::default);
    if is_new {
        spec.selector = LabelSelector {
            match_labels: Some(labels.clone()),
            ..Default::default()
        };
    }
    spec.replicas = Some(docling_serve.spec.api_server.instances);
    spec.template.metadata.get_or_insert_with(Default::default).labels = Some(labels);

    let pod = spec.template.spec.get_or_insert_with(Default::default);
    pod.service_account_name = Some(service_account_name(docling_serve));

    let mut container = pod
        .containers
        .iter()
        .find(|c| c.name == CONTAINER_NAME)
        .cloned()
        .unwrap_or_default();
    apply_api_server_container(&mut container, docling_serve);
    pod.containers = vec![container];
}

fn apply_api_server_container(container: &mut Container, docling_serve: &DoclingServe) {
    let api_server = &docling_serve.spec.api_server;
    let env = container_env(docling_serve);

    container.name = CONTAINER_NAME.to_string();
    container.image = Some(api_server.image.clone());
    container.image_pull_policy = Some("IfNotPresent".to_string());
    container.command = Some(vec!["docling-serve".to_string(), "run".to_string()]);
    container.ports = Some(vec![ContainerPort {
        name: Some(HTTP_PORT_NAME.to_string()),
        container_port: HTTP_PORT,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }]);
    container.env = (!env.is_empty()).then_some(env);
    container.env_from = api_server.config_map_name.as_ref().map(|config_map| {
        vec![EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: config_map.clone().into(),
                ..Default::default()
            }),
            ..Default::default()
        }]
    });
    apply_health_probe(container.liveness_probe.get_or_insert_with(Default::default));
    apply_health_probe(container.readiness_probe.get_or_insert_with(Default::default));
}

/// Environment for the API server, in a fixed order
fn container_env(docling_serve: &DoclingServe) -> Vec<EnvVar> {
    let spec = &docling_serve.spec;
    let mut env = Vec::new();
    if spec.api_server.enable_ui {
        env.push(env_var(ENV_ENABLE_UI, "true"));
    }
    if let Some(local) = &spec.engine.local {
        env.push(env_var(ENV_LOCAL_NUM_WORKERS, &local.num_workers.to_string()));
    }
    if let Some(kfp) = &spec.engine.kfp {
        env.push(env_var(ENV_KFP_ENDPOINT, &kfp.endpoint));
    }
    env
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

// Timings and scheme are left to the server defaults
fn apply_health_probe(probe: &mut Probe) {
    let http_get = probe.http_get.get_or_insert_with(Default::default);
    http_get.path = Some(HEALTH_PATH.to_string());
    http_get.port = IntOrString::String(HTTP_PORT_NAME.to_string());
}

#[async_trait]
impl SubResourceReconciler for DeploymentReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployment
    }

    async fn reconcile(&self, ctx: &PassContext, docling_serve: &DoclingServe) -> ReconcileResult {
        let result = self.converge(docling_serve).await;
        ReconcileResult::from_applied(ctx, self.kind(), &deployment_name(docling_serve), result)
    }
}
