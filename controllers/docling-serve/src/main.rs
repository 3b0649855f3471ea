//! Docling Operator
//!
//! Kubernetes controller for DoclingServe resources. Each DoclingServe is
//! converged into:
//! - a ServiceAccount the workload runs as
//! - a Deployment running the docling-serve API server
//! - a Service exposing it inside the cluster
//! - optionally, an OpenShift Route exposing it outside the cluster
//!
//! and its status reports the health of those objects as conditions.

mod backoff;
mod config;
mod controller;
mod error;
mod reconcile_helpers;
#[cfg(test)]
mod reconcile_helpers_test;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::OperatorConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting Docling Operator");

    let config = OperatorConfig::from_env()?;
    info!("Configuration:");
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Concurrency: {}", config.concurrency);
    info!("  Debounce: {}s", config.debounce.as_secs());
    info!("  Backoff: {}m..{}m", config.backoff_min_minutes, config.backoff_max_minutes);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
