//! Status projection and commit
//!
//! Reads the live state of the Deployment, Service and Route owned by a
//! DoclingServe and merges what it finds into the parent's conditions. A
//! failed read is reported as an `Unknown` condition rather than an error.
//! The status is then written back with the parent's resourceVersion as a
//! precondition, unless nothing changed.

use super::conditions::set_status_condition;
use super::{PassContext, ReconcileResult};
use crate::error::ControllerError;
use crate::reconcile_helpers::{deployment_name, route_name, service_name};
use chrono::{DateTime, Utc};
use cluster_client::{ClusterClientTrait, ClusterError, ResourceKind};
use crds::{Condition, ConditionStatus, DoclingServe, Route};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEPLOYMENT_CREATED: &str = "DeploymentCreated";
pub const DEPLOYMENT_AVAILABLE: &str = "DeploymentAvailable";
pub const SERVICE_CREATED: &str = "ServiceCreated";
pub const LOAD_BALANCER_ASSIGNED: &str = "LoadBalancerAssigned";
pub const ROUTE_CREATED: &str = "RouteCreated";
pub const ROUTE_DISABLED_REASON: &str = "RouteDisabled";

pub struct StatusReconciler {
    client: Arc<dyn ClusterClientTrait>,
}

impl StatusReconciler {
    pub fn new(client: Arc<dyn ClusterClientTrait>) -> Self {
        Self { client }
    }

    /// Project the live state of every owned object into `docling_serve.status`.
    pub async fn project(&self, ctx: &PassContext, docling_serve: &mut DoclingServe, now: DateTime<Utc>) {
        let namespace = ctx.namespace.as_str();
        let generation = docling_serve.metadata.generation;
        let mut projected = Vec::new();

        let deployment = self.client.get_deployment(namespace, &deployment_name(docling_serve)).await;
        log_fetch_failure(ctx, ResourceKind::Deployment, &deployment);
        projected.extend(deployment_conditions(&deployment));

        let service = self.client.get_service(namespace, &service_name(docling_serve)).await;
        log_fetch_failure(ctx, ResourceKind::Service, &service);
        projected.extend(service_conditions(&service));

        if docling_serve.spec.route_enabled() {
            let route = self.client.get_route(namespace, &route_name(docling_serve)).await;
            log_fetch_failure(ctx, ResourceKind::Route, &route);
            projected.extend(route_conditions(&route));
        } else {
            projected.push(route_disabled_condition());
        }

        let status = docling_serve.status.get_or_insert_with(Default::default);
        status.observed_generation = generation;
        for condition in projected {
            set_status_condition(&mut status.conditions, condition.observed(generation), now);
        }
    }

    /// Persist `working.status` if it differs from what `parent` was read with.
    pub async fn commit(&self, ctx: &PassContext, parent: &DoclingServe, working: &DoclingServe) -> ReconcileResult {
        let Some(status) = working.status.as_ref() else {
            return ReconcileResult::done();
        };
        if parent.status.as_ref() == Some(status) {
            debug!(parent: &ctx.span, "DoclingServe status unchanged, skipping update");
            return ReconcileResult::done();
        }

        let resource_version = parent.resource_version();
        match self
            .client
            .patch_docling_serve_status(&ctx.namespace, &ctx.name, resource_version.as_deref(), status)
            .await
        {
            Ok(_) => {
                info!(parent: &ctx.span, "Updated DoclingServe status");
                ReconcileResult::done()
            }
            Err(e) if e.is_conflict() => {
                info!(parent: &ctx.span, "Conflict updating DoclingServe status, will retry: {}", e);
                ReconcileResult::retry(ControllerError::Cluster(e))
            }
            Err(e) => {
                error!(parent: &ctx.span, "Failed to update DoclingServe status: {}", e);
                ReconcileResult::retry(ControllerError::Cluster(e))
            }
        }
    }
}

fn log_fetch_failure<K>(ctx: &PassContext, kind: ResourceKind, fetched: &Result<K, ClusterError>) {
    if let Err(e) = fetched {
        warn!(parent: &ctx.span, "Failed to get {} for status: {}", kind, e);
    }
}

fn status_error_condition(kind: ResourceKind, error: &ClusterError) -> Condition {
    Condition::new(
        format!("{}Created", kind),
        ConditionStatus::Unknown,
        format!("{}StatusError", kind),
        error.to_string(),
    )
}

/// Conditions describing the Deployment
pub(crate) fn deployment_conditions(fetched: &Result<Deployment, ClusterError>) -> Vec<Condition> {
    let deployment = match fetched {
        Ok(deployment) => deployment,
        Err(e) => return vec![status_error_condition(ResourceKind::Deployment, e)],
    };
    let Some(status) = deployment.status.as_ref() else {
        return Vec::new();
    };

    let mut conditions = vec![Condition::new(
        DEPLOYMENT_CREATED,
        ConditionStatus::True,
        DEPLOYMENT_CREATED,
        "The docling deployment was created successfully",
    )];
    let live = status.conditions.as_deref().unwrap_or_default();
    if let Some(available) = live.iter().find(|c| c.type_ == "Available") {
        conditions.push(Condition::new(
            DEPLOYMENT_AVAILABLE,
            ConditionStatus::from_k8s(&available.status),
            available.reason.clone().unwrap_or_default(),
            available.message.clone().unwrap_or_default(),
        ));
    }
    if let Some(latest) = live.last() {
        conditions.push(Condition::new(
            latest.type_.clone(),
            ConditionStatus::from_k8s(&latest.status),
            latest.reason.clone().unwrap_or_default(),
            latest.message.clone().unwrap_or_default(),
        ));
    }
    conditions
}

/// Conditions describing the Service
pub(crate) fn service_conditions(fetched: &Result<Service, ClusterError>) -> Vec<Condition> {
    let service = match fetched {
        Ok(service) => service,
        Err(e) => return vec![status_error_condition(ResourceKind::Service, e)],
    };
    let Some(status) = service.status.as_ref() else {
        return Vec::new();
    };

    let mut conditions = vec![Condition::new(
        SERVICE_CREATED,
        ConditionStatus::True,
        SERVICE_CREATED,
        "The docling service was created successfully",
    )];
    let has_ingress = status
        .load_balancer
        .as_ref()
        .and_then(|lb| lb.ingress.as_ref())
        .is_some_and(|ingress| !ingress.is_empty());
    if has_ingress {
        conditions.push(Condition::new(
            LOAD_BALANCER_ASSIGNED,
            ConditionStatus::True,
            LOAD_BALANCER_ASSIGNED,
            "A LoadBalancer has been assigned to the docling service",
        ));
    }
    if let Some(latest) = status.conditions.as_deref().and_then(<[_]>::last) {
        conditions.push(Condition::new(
            latest.type_.clone(),
            ConditionStatus::from_k8s(&latest.status),
            latest.reason.clone(),
            latest.message.clone(),
        ));
    }
    conditions
}

/// Conditions describing an enabled Route
pub(crate) fn route_conditions(fetched: &Result<Route, ClusterError>) -> Vec<Condition> {
    let route = match fetched {
        Ok(route) => route,
        Err(e) => return vec![status_error_condition(ResourceKind::Route, e)],
    };
    let Some(status) = route.status.as_ref() else {
        return Vec::new();
    };

    let mut conditions = vec![Condition::new(
        ROUTE_CREATED,
        ConditionStatus::True,
        ROUTE_CREATED,
        "A docling route was created successfully",
    )];
    if let Some(latest) = status.ingress.first().and_then(|ingress| ingress.conditions.last()) {
        conditions.push(Condition::new(
            latest.r#type.clone(),
            ConditionStatus::from_k8s(&latest.status),
            latest.reason.clone().unwrap_or_default(),
            latest.message.clone().unwrap_or_default(),
        ));
    }
    conditions
}

pub(crate) fn route_disabled_condition() -> Condition {
    Condition::new(
        ROUTE_CREATED,
        ConditionStatus::True,
        ROUTE_DISABLED_REASON,
        "A docling route is disabled",
    )
}
