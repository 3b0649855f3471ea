//! Main controller implementation.
//!
//! This module contains the `Controller` struct that builds the Kubernetes
//! client, the reconciler and the watcher for DoclingServe resources.

use crate::backoff::BackoffTracker;
use crate::config::OperatorConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::{WatchContext, Watcher};
use cluster_client::KubeClusterClient;
use crds::{DoclingServe, Route};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main controller for DoclingServe resources.
pub struct Controller {
    docling_serve_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts watching.
    pub async fn new(config: OperatorConfig) -> Result<Self, ControllerError> {
        info!("Initializing Docling Operator");

        let kube_client = Client::try_default().await?;

        let reconciler = Reconciler::new(KubeClusterClient::new(kube_client.clone()));
        info!("Sub-resources reconciled in order: {:?}", reconciler.sub_resource_kinds());
        let context = Arc::new(WatchContext {
            reconciler,
            backoff: BackoffTracker::new(config.backoff_min_minutes, config.backoff_max_minutes),
        });

        let watcher = match config.watch_namespace.as_deref() {
            Some(ns) => Watcher::new(
                context,
                config.clone(),
                Api::namespaced(kube_client.clone(), ns),
                Api::namespaced(kube_client.clone(), ns),
                Api::namespaced(kube_client.clone(), ns),
                Api::namespaced(kube_client.clone(), ns),
                Api::namespaced(kube_client, ns),
            ),
            None => Watcher::new(
                context,
                config.clone(),
                Api::<DoclingServe>::all(kube_client.clone()),
                Api::<ServiceAccount>::all(kube_client.clone()),
                Api::<Deployment>::all(kube_client.clone()),
                Api::<Service>::all(kube_client.clone()),
                Api::<Route>::all(kube_client),
            ),
        };

        let docling_serve_watcher = tokio::spawn(watcher.watch_docling_serves());

        Ok(Self { docling_serve_watcher })
    }

    /// Runs until the watcher stops.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Docling Operator running");

        match self.docling_serve_watcher.await {
            Ok(result) => result,
            Err(e) => {
                error!("DoclingServe watcher task failed: {}", e);
                Err(ControllerError::Watch(e.to_string()))
            }
        }
    }
}
