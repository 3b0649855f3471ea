//! Integration tests for the Kubernetes-backed cluster client
//!
//! These tests require a reachable cluster with the DoclingServe CRD installed.
//! Set KUBECONFIG (or run in-cluster) and TEST_NAMESPACE to run.

use cluster_client::{ClusterClientTrait, KubeClusterClient};

#[tokio::test]
#[ignore] // Requires running cluster
async fn test_missing_deployment_is_not_found() {
    let namespace = std::env::var("TEST_NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let client = KubeClusterClient::try_default().await.expect("Failed to create client");

    let result = client
        .get_deployment(&namespace, "docling-operator-integration-missing-deployment")
        .await;

    match result {
        Err(e) => assert!(e.is_not_found(), "expected NotFound, got {}", e),
        Ok(_) => panic!("deployment should not exist"),
    }
}

#[tokio::test]
#[ignore]
async fn test_missing_route_delete_is_not_found() {
    let namespace = std::env::var("TEST_NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let client = KubeClusterClient::try_default().await.expect("Failed to create client");

    let result = client
        .delete_route(&namespace, "docling-operator-integration-missing-route")
        .await;

    assert!(result.is_err_and(|e| e.is_not_found()));
}
