//! Reconciliation logic for DoclingServe resources.
//!
//! A pass runs a fixed, ordered list of sub-resource reconcilers against one
//! DoclingServe, then projects the live state of the owned objects into the
//! parent's conditions and commits the status:
//! - `service_account`: ServiceAccount the pods run as
//! - `deployment`: the docling-serve workload
//! - `service`: in-cluster endpoint for the workload
//! - `route`: optional external Route, created or deleted with the spec flag
//! - `status`: condition projection and status commit
//!
//! Every reconciler runs on every pass; one failing does not skip the rest.

pub mod conditions;
pub mod deployment;
pub mod route;
pub mod service;
pub mod service_account;
pub mod status;

#[cfg(test)]
mod status_test;

use crate::error::ControllerError;
use crate::reconcile_helpers::Applied;
use async_trait::async_trait;
use chrono::Utc;
use cluster_client::{ClusterClientTrait, ResourceKind};
use crds::DoclingServe;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Span, debug, error, info, info_span, warn};

use deployment::DeploymentReconciler;
use route::RouteReconciler;
use service::ServiceReconciler;
use service_account::ServiceAccountReconciler;
use status::StatusReconciler;

/// Per-pass state shared by every reconciler in the pass
#[derive(Debug, Clone)]
pub struct PassContext {
    pub namespace: String,
    pub name: String,
    /// Span every log line of the pass is attached to
    pub span: Span,
}

impl PassContext {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            span: info_span!(
                "reconcile",
                namespace = %namespace,
                name = %name,
                generation = tracing::field::Empty
            ),
        }
    }
}

/// Outcome of one reconciler
#[derive(Debug, Default)]
pub struct ReconcileResult {
    /// Ask for another pass even without a watch event
    pub requeue: bool,
    pub error: Option<ControllerError>,
}

impl ReconcileResult {
    pub fn done() -> Self {
        Self::default()
    }

    /// Failed; retry later
    pub fn retry(error: ControllerError) -> Self {
        Self {
            requeue: true,
            error: Some(error),
        }
    }

    /// Log and wrap the result of converging one owned object
    pub(crate) fn from_applied(
        ctx: &PassContext,
        kind: ResourceKind,
        name: &str,
        result: Result<Applied, ControllerError>,
    ) -> Self {
        match result {
            Ok(applied) if applied.mutated() => {
                info!(parent: &ctx.span, "{} {} {}", kind, name, applied);
                Self::done()
            }
            Ok(applied) => {
                debug!(parent: &ctx.span, "{} {} {}", kind, name, applied);
                Self::done()
            }
            Err(e) if e.is_conflict() => {
                info!(parent: &ctx.span, "Conflict reconciling {} {}, will retry: {}", kind, name, e);
                Self::retry(e)
            }
            Err(e) => {
                error!(parent: &ctx.span, "Error reconciling {} {}: {}", kind, name, e);
                Self::retry(e)
            }
        }
    }
}

/// One convergence step of a pass, owning a single sub-resource kind.
///
/// Implementations must be idempotent: against a converged store a second
/// call performs no writes.
#[async_trait]
pub trait SubResourceReconciler: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn reconcile(&self, ctx: &PassContext, docling_serve: &DoclingServe) -> ReconcileResult;
}

/// Aggregate outcome of a pass
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// OR of every reconciler's requeue flag
    pub requeue: bool,
    /// First error in reconciler order
    pub error: Option<ControllerError>,
    /// Errors after the first, in order
    pub suppressed_errors: Vec<ControllerError>,
}

impl PassOutcome {
    fn absorb(&mut self, ctx: &PassContext, step: &str, result: ReconcileResult) {
        self.requeue |= result.requeue;
        if let Some(e) = result.error {
            if self.error.is_none() {
                self.error = Some(e);
            } else {
                warn!(parent: &ctx.span, "Additional failure in {} step: {}", step, e);
                self.suppressed_errors.push(e);
            }
        }
    }

    /// Pass had no error and asked for no retry
    pub fn is_clean(&self) -> bool {
        !self.requeue && self.error.is_none()
    }
}

/// Reconciles DoclingServe resources.
pub struct Reconciler {
    pub(crate) client: Arc<dyn ClusterClientTrait>,
    sub_resources: Vec<Box<dyn SubResourceReconciler>>,
    status: StatusReconciler,
}

impl Reconciler {
    pub fn new(client: impl ClusterClientTrait + 'static) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    pub fn with_shared_client(client: Arc<dyn ClusterClientTrait>) -> Self {
        let sub_resources: Vec<Box<dyn SubResourceReconciler>> = vec![
            Box::new(ServiceAccountReconciler::new(client.clone())),
            Box::new(DeploymentReconciler::new(client.clone())),
            Box::new(ServiceReconciler::new(client.clone())),
            Box::new(RouteReconciler::new(client.clone())),
        ];
        Self::from_parts(client, sub_resources)
    }

    /// Reconciler running `sub_resources` in the given order before the status step
    pub fn from_parts(client: Arc<dyn ClusterClientTrait>, sub_resources: Vec<Box<dyn SubResourceReconciler>>) -> Self {
        Self {
            status: StatusReconciler::new(client.clone()),
            client,
            sub_resources,
        }
    }

    /// Kinds converged by a pass, in execution order
    pub fn sub_resource_kinds(&self) -> Vec<ResourceKind> {
        self.sub_resources.iter().map(|r| r.kind()).collect()
    }

    /// Run one reconciliation pass for the DoclingServe `namespace/name`.
    pub async fn reconcile_docling_serve(&self, namespace: &str, name: &str) -> PassOutcome {
        let ctx = PassContext::new(namespace, name);

        let parent = match self.client.get_docling_serve(namespace, name).await {
            Ok(parent) => parent,
            Err(e) if e.is_not_found() => {
                info!(parent: &ctx.span, "DoclingServe not found, ignoring since object must be deleted");
                return PassOutcome::default();
            }
            Err(e) => {
                error!(parent: &ctx.span, "Failed to get DoclingServe: {}", e);
                return PassOutcome {
                    requeue: true,
                    error: Some(e.into()),
                    suppressed_errors: Vec::new(),
                };
            }
        };
        if let Some(generation) = parent.metadata.generation {
            ctx.span.record("generation", generation);
        }
        debug!(parent: &ctx.span, "Starting reconciliation pass");

        let mut outcome = PassOutcome::default();
        let mut working = parent.clone();
        for sub_resource in &self.sub_resources {
            let step = sub_resource.kind().as_str();
            let result = guarded(&ctx, step, sub_resource.reconcile(&ctx, &working)).await;
            outcome.absorb(&ctx, step, result);
        }
        let projected = guarded(&ctx, "status projection", async {
            self.status.project(&ctx, &mut working, Utc::now()).await;
            ReconcileResult::done()
        })
        .await;
        outcome.absorb(&ctx, "status projection", projected);

        // Runs on every path so partial progress is recorded.
        let committed = self.status.commit(&ctx, &parent, &working).await;
        outcome.absorb(&ctx, ResourceKind::DoclingServe.as_str(), committed);

        debug!(
            parent: &ctx.span,
            "Reconciliation pass finished (requeue: {}, error: {})",
            outcome.requeue,
            outcome.error.is_some()
        );
        outcome
    }
}

/// Run one step of a pass, turning a panic into a retryable error.
async fn guarded<F>(ctx: &PassContext, step: &str, step_future: F) -> ReconcileResult
where
    F: Future<Output = ReconcileResult>,
{
    match AssertUnwindSafe(step_future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(parent: &ctx.span, "{} step panicked: {}", step, message);
            ReconcileResult::retry(ControllerError::Reconciliation(format!(
                "{} step panicked: {}",
                step, message
            )))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
