//! Kubernetes resource watchers.
//!
//! This module watches DoclingServe resources and the objects they own, and
//! triggers reconciliation through `kube_runtime::Controller`. A change to
//! an owned ServiceAccount, Deployment, Service or Route re-queues the owning
//! DoclingServe, so drift is repaired without waiting for a spec change.

use crate::backoff::BackoffTracker;
use crate::config::OperatorConfig;
use crate::error::ControllerError;
use crate::reconciler::{PassOutcome, Reconciler};
use crds::{DoclingServe, Route};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{Controller, watcher};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// State shared by every reconcile call of the controller
pub struct WatchContext {
    pub reconciler: Reconciler,
    pub backoff: BackoffTracker,
}

/// Watches DoclingServes and their owned objects.
pub struct Watcher {
    context: Arc<WatchContext>,
    config: OperatorConfig,
    docling_serve_api: Api<DoclingServe>,
    service_account_api: Api<ServiceAccount>,
    deployment_api: Api<Deployment>,
    service_api: Api<Service>,
    route_api: Api<Route>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        context: Arc<WatchContext>,
        config: OperatorConfig,
        docling_serve_api: Api<DoclingServe>,
        service_account_api: Api<ServiceAccount>,
        deployment_api: Api<Deployment>,
        service_api: Api<Service>,
        route_api: Api<Route>,
    ) -> Self {
        Self {
            context,
            config,
            docling_serve_api,
            service_account_api,
            deployment_api,
            service_api,
            route_api,
        }
    }

    /// Runs the DoclingServe controller until a shutdown signal arrives.
    pub async fn watch_docling_serves(self) -> Result<(), ControllerError> {
        info!("Starting DoclingServe watcher");

        let controller_config = ControllerConfig::default()
            .debounce(self.config.debounce)
            .concurrency(self.config.concurrency);

        Controller::new(self.docling_serve_api, watcher::Config::default())
            .owns(self.service_account_api, watcher::Config::default())
            .owns(self.deployment_api, watcher::Config::default())
            .owns(self.service_api, watcher::Config::default())
            .owns(self.route_api, watcher::Config::default())
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.context)
            .for_each(|res| async move {
                match res {
                    Ok((object, _)) => debug!("Reconciled DoclingServe {}", object),
                    Err(e) => warn!("DoclingServe controller error: {}", e),
                }
            })
            .await;

        info!("DoclingServe watcher stopped");
        Ok(())
    }
}

fn object_key(docling_serve: &DoclingServe) -> (String, String) {
    (docling_serve.namespace().unwrap_or_default(), docling_serve.name_any())
}

async fn reconcile(docling_serve: Arc<DoclingServe>, ctx: Arc<WatchContext>) -> Result<Action, ControllerError> {
    let (namespace, name) = object_key(&docling_serve);
    let outcome = ctx.reconciler.reconcile_docling_serve(&namespace, &name).await;
    next_action(&ctx.backoff, &format!("{}/{}", namespace, name), outcome)
}

/// Map a pass outcome onto what the controller runtime does next.
///
/// Failures are returned as errors so `error_policy` applies the backoff.
fn next_action(backoff: &BackoffTracker, key: &str, outcome: PassOutcome) -> Result<Action, ControllerError> {
    if let Some(e) = outcome.error {
        return Err(e);
    }
    if outcome.requeue {
        let (delay, attempts) = backoff.record_failure(key);
        info!("Requeuing DoclingServe {} in {}s (attempt {})", key, delay.as_secs(), attempts);
        return Ok(Action::requeue(delay));
    }
    backoff.reset(key);
    Ok(Action::await_change())
}

fn error_policy(docling_serve: Arc<DoclingServe>, error: &ControllerError, ctx: Arc<WatchContext>) -> Action {
    let (namespace, name) = object_key(&docling_serve);
    let key = format!("{}/{}", namespace, name);
    let (delay, attempts) = ctx.backoff.record_failure(&key);
    if error.is_conflict() {
        info!("Conflict reconciling DoclingServe {}, retrying in {}s: {}", key, delay.as_secs(), error);
    } else {
        error!(
            "Reconciliation error for DoclingServe {} (attempt {}), retrying in {}s: {}",
            key,
            attempts,
            delay.as_secs(),
            error
        );
    }
    Action::requeue(delay)
}
