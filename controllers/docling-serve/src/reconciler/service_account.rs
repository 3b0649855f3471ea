//! ServiceAccount reconciler
//!
//! Ensures `<name>-serviceaccount` exists, carries the instance labels and is
//! controlled by its DoclingServe.

use super::{PassContext, ReconcileResult, SubResourceReconciler};
use crate::error::ControllerError;
use crate::reconcile_helpers::{
    labels_for, namespace_of, plan_create_or_update, service_account_name, set_controller_reference, Applied, Plan,
};
use async_trait::async_trait;
use cluster_client::{ClusterClientTrait, ResourceKind};
use crds::DoclingServe;
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::sync::Arc;

pub struct ServiceAccountReconciler {
    client: Arc<dyn ClusterClientTrait>,
}

impl ServiceAccountReconciler {
    pub fn new(client: Arc<dyn ClusterClientTrait>) -> Self {
        Self { client }
    }

    async fn converge(&self, docling_serve: &DoclingServe) -> Result<Applied, ControllerError> {
        let namespace = namespace_of(docling_serve)?;
        let name = service_account_name(docling_serve);

        let plan = plan_create_or_update(
            self.client.get_service_account(&namespace, &name).await,
            || ServiceAccount {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    namespace: Some(namespace.clone()),
                    ..Default::default()
                },
                ..Default::default()
            },
            |service_account| {
                service_account.metadata.labels = Some(labels_for(&docling_serve.name_any()));
                set_controller_reference(docling_serve, service_account)
            },
        )?;

        let applied = Applied::from(&plan);
        match plan {
            Plan::Create(service_account) => {
                self.client.create_service_account(&namespace, &service_account).await?;
            }
            Plan::Update(service_account) => {
                self.client.replace_service_account(&namespace, &service_account).await?;
            }
            Plan::Unchanged(_) => {}
        }
        Ok(applied)
    }
}

#[async_trait]
impl SubResourceReconciler for ServiceAccountReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ServiceAccount
    }

    async fn reconcile(&self, ctx: &PassContext, docling_serve: &DoclingServe) -> ReconcileResult {
        let result = self.converge(docling_serve).await;
        ReconcileResult::from_applied(ctx, self.kind(), &service_account_name(docling_serve), result)
    }
}
