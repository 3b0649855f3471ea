//! Service reconciler
//!
//! Exposes the docling-serve pods inside the cluster as `<name>-service`.
//! Only the selector, the `http` port and the labels are managed; fields
//! populated by the API server (cluster IP, type, node port) are left as they are.

use super::deployment::{HTTP_PORT, HTTP_PORT_NAME};
use super::{PassContext, ReconcileResult, SubResourceReconciler};
use crate::error::ControllerError;
use crate::reconcile_helpers::{
    labels_for, namespace_of, plan_create_or_update, service_name, set_controller_reference, Applied, Plan,
};
use async_trait::async_trait;
use cluster_client::{ClusterClientTrait, ResourceKind};
use crds::DoclingServe;
use k8s_openapi::api::core::v1::{Service, ServicePort};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::sync::Arc;

pub struct ServiceReconciler {
    client: Arc<dyn ClusterClientTrait>,
}

impl ServiceReconciler {
    pub fn new(client: Arc<dyn ClusterClientTrait>) -> Self {
        Self { client }
    }

    async fn converge(&self, docling_serve: &DoclingServe) -> Result<Applied, ControllerError> {
        let namespace = namespace_of(docling_serve)?;
        let name = service_name(docling_serve);

        let plan = plan_create_or_update(
            self.client.get_service(&namespace, &name).await,
            || Service {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    namespace: Some(namespace.clone()),
                    ..Default::default()
                },
                ..Default::default()
            },
            |service| {
                apply_service_spec(service, docling_serve);
                set_controller_reference(docling_serve, service)
            },
        )?;

        let applied = Applied::from(&plan);
        match plan {
            Plan::Create(service) => {
                self.client.create_service(&namespace, &service).await?;
            }
            Plan::Update(service) => {
                self.client.replace_service(&namespace, &service).await?;
            }
            Plan::Unchanged(_) => {}
        }
        Ok(applied)
    }
}

/// Write the managed fields of the Service
pub fn apply_service_spec(service: &mut Service, docling_serve: &DoclingServe) {
    let labels = labels_for(&docling_serve.name_any());
    service.metadata.labels = Some(labels.clone());

    let spec = service.spec.get_or_insert_with(Default::default);
    spec.selector = Some(labels);
    // Allocated by the API server for NodePort and LoadBalancer services
    let node_port = spec
        .ports
        .iter()
        .flatten()
        .find(|p| p.name.as_deref() == Some(HTTP_PORT_NAME))
        .and_then(|p| p.node_port);
    spec.ports = Some(vec![ServicePort {
        name: Some(HTTP_PORT_NAME.to_string()),
        protocol: Some("TCP".to_string()),
        port: HTTP_PORT,
        target_port: Some(IntOrString::String(HTTP_PORT_NAME.to_string())),
        node_port,
        ..Default::default()
    }]);
}

#[async_trait]
impl SubResourceReconciler for ServiceReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Service
    }

    async fn reconcile(&self, ctx: &PassContext, docling_serve: &DoclingServe) -> ReconcileResult {
        let result = self.converge(docling_serve).await;
        ReconcileResult::from_applied(ctx, self.kind(), &service_name(docling_serve), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_docling_serve;

    #[test]
    fn test_apply_service_spec_keeps_server_fields() {
        let docling_serve = create_test_docling_serve("docling", "default");
        let mut service = Service::default();
        service.spec.get_or_insert_with(Default::default).cluster_ip = Some("10.0.0.12".to_string());
        service.spec.get_or_insert_with(Default::default).type_ = Some("LoadBalancer".to_string());

        apply_service_spec(&mut service, &docling_serve);

        let spec = service.spec.expect("spec is set");
        assert_eq!(spec.cluster_ip.as_deref(), Some("10.0.0.12"));
        assert_eq!(spec.type_.as_deref(), Some("LoadBalancer"));
        assert_eq!(spec.selector, Some(labels_for("docling")));

        let ports = spec.ports.expect("ports are set");
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("http"));
        assert_eq!(ports[0].port, 5001);
        assert_eq!(ports[0].target_port, Some(IntOrString::String("http".to_string())));
    }
}
