//! Route reconciler
//!
//! Lifecycle of the optional external Route `<name>-route`:
//! - route enabled: create or update it, pointing at the Service's `http` port
//!   with edge TLS termination
//! - route disabled or absent from the spec: delete it if present
//!
//! The router assigns `spec.host` when the Route is created and the backend
//! weight is defaulted; both are carried over on update.

use super::deployment::HTTP_PORT_NAME;
use super::{PassContext, ReconcileResult, SubResourceReconciler};
use crate::error::ControllerError;
use crate::reconcile_helpers::{
    labels_for, namespace_of, plan_create_or_update, route_name, service_name, set_controller_reference, Applied,
    Plan,
};
use async_trait::async_trait;
use cluster_client::{ClusterClientTrait, ResourceKind};
use crds::{DoclingServe, Route, RoutePort, RouteSpec, TargetPort, TlsTermination};
use kube::ResourceExt;
use std::sync::Arc;

pub struct RouteReconciler {
    client: Arc<dyn ClusterClientTrait>,
}

impl RouteReconciler {
    pub fn new(client: Arc<dyn ClusterClientTrait>) -> Self {
        Self { client }
    }

    async fn converge(&self, docling_serve: &DoclingServe) -> Result<Applied, ControllerError> {
        let namespace = namespace_of(docling_serve)?;
        let name = route_name(docling_serve);

        let plan = plan_create_or_update(
            self.client.get_route(&namespace, &name).await,
            || {
                let mut route = Route::new(&name, RouteSpec::default());
                route.metadata.namespace = Some(namespace.clone());
                route
            },
            |route| {
                apply_route_spec(route, docling_serve);
                set_controller_reference(docling_serve, route)
            },
        )?;

        let applied = Applied::from(&plan);
        match plan {
            Plan::Create(route) => {
                self.client.create_route(&namespace, &route).await?;
            }
            Plan::Update(route) => {
                self.client.replace_route(&namespace, &route).await?;
            }
            Plan::Unchanged(_) => {}
        }
        Ok(applied)
    }

    async fn remove(&self, docling_serve: &DoclingServe) -> Result<Applied, ControllerError> {
        let namespace = namespace_of(docling_serve)?;
        match self.client.delete_route(&namespace, &route_name(docling_serve)).await {
            Ok(()) => Ok(Applied::Deleted),
            Err(e) if e.is_not_found() => Ok(Applied::Absent),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write the managed fields of the Route.
///
/// The assigned host, the backend weight and the insecure-edge policy are
/// defaulted by OpenShift and kept as stored.
pub fn apply_route_spec(route: &mut Route, docling_serve: &DoclingServe) {
    route.metadata.labels = Some(labels_for(&docling_serve.name_any()));

    let spec = &mut route.spec;
    spec.path = Some("/".to_string());
    spec.to.kind = "Service".to_string();
    spec.to.name = service_name(docling_serve);
    spec.port = Some(RoutePort {
        target_port: TargetPort::Name(HTTP_PORT_NAME.to_string()),
    });
    spec.tls.get_or_insert_with(Default::default).termination = TlsTermination::Edge;
}

#[async_trait]
impl SubResourceReconciler for RouteReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Route
    }

    async fn reconcile(&self, ctx: &PassContext, docling_serve: &DoclingServe) -> ReconcileResult {
        let result = if docling_serve.spec.route_enabled() {
            self.converge(docling_serve).await
        } else {
            self.remove(docling_serve).await
        };
        ReconcileResult::from_applied(ctx, self.kind(), &route_name(docling_serve), result)
    }
}
