//! Behaviour of the in-memory store the controller tests rely on

use cluster_client::{ClusterClientTrait, InjectedFailure, MockClusterClient, ResourceKind};
use crds::{
    ApiServer, DoclingServe, DoclingServeSpec, DoclingServeStatus, Engine, LocalEngine, Route, RouteSpec,
    RouteTargetReference,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

fn docling_serve(name: &str) -> DoclingServe {
    DoclingServe {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("docling".to_string()),
            ..Default::default()
        },
        spec: DoclingServeSpec {
            api_server: ApiServer {
                image: "quay.io/docling-project/docling-serve:latest".to_string(),
                enable_ui: false,
                instances: 1,
                config_map_name: None,
            },
            engine: Engine {
                local: Some(LocalEngine::default()),
                kfp: None,
            },
            route: None,
        },
        status: None,
    }
}

fn deployment(name: &str, owner_uid: Option<&str>) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            owner_references: owner_uid.map(|uid| {
                vec![OwnerReference {
                    api_version: "docling.github.io/v1alpha1".to_string(),
                    kind: "DoclingServe".to_string(),
                    name: "owner".to_string(),
                    uid: uid.to_string(),
                    controller: Some(true),
                    block_owner_deletion: Some(true),
                }]
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_assigns_identity_and_empty_status() {
    let mock = MockClusterClient::new();

    let created = mock
        .create_deployment("docling", &deployment("app-deployment", None))
        .await
        .expect("create should succeed");

    assert!(created.metadata.uid.is_some());
    assert!(created.metadata.resource_version.is_some());
    assert_eq!(created.status, Some(Default::default()));
    assert_eq!(mock.mutation_count(ResourceKind::Deployment), 1);
}

#[tokio::test]
async fn test_create_twice_conflicts() {
    let mock = MockClusterClient::new();
    mock.create_deployment("docling", &deployment("app-deployment", None))
        .await
        .expect("first create should succeed");

    let err = mock
        .create_deployment("docling", &deployment("app-deployment", None))
        .await
        .expect_err("second create should fail");
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_stale_replace_conflicts() {
    let mock = MockClusterClient::new();
    let created = mock
        .create_deployment("docling", &deployment("app-deployment", None))
        .await
        .expect("create should succeed");

    // Someone else writes in between our read and our write
    mock.edit_deployment("docling", "app-deployment", |d| {
        d.metadata.labels = Some([("edited".to_string(), "true".to_string())].into());
    });

    let err = mock
        .replace_deployment("docling", &created)
        .await
        .expect_err("replace with stale resourceVersion should fail");
    assert!(err.is_conflict());
    assert_eq!(mock.mutation_count(ResourceKind::Deployment), 1);
}

#[tokio::test]
async fn test_injected_failures_until_cleared() {
    let mock = MockClusterClient::new();
    mock.fail_writes(ResourceKind::ServiceAccount, InjectedFailure::Conflict);
    mock.fail_reads(ResourceKind::Route, InjectedFailure::Api("forbidden".to_string()));

    let sa = k8s_openapi::api::core::v1::ServiceAccount {
        metadata: ObjectMeta {
            name: Some("app-serviceaccount".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(mock.create_service_account("docling", &sa).await.is_err_and(|e| e.is_conflict()));
    assert!(mock.get_route("docling", "app-route").await.is_err_and(|e| !e.is_not_found()));

    mock.clear_failures();
    assert!(mock.create_service_account("docling", &sa).await.is_ok());
    assert!(mock.get_route("docling", "app-route").await.is_err_and(|e| e.is_not_found()));
}

#[tokio::test]
async fn test_status_patch_checks_resource_version() {
    let mock = MockClusterClient::new();
    let stored = mock.add_docling_serve(docling_serve("app"));
    let rv = stored.metadata.resource_version.clone();

    mock.update_docling_serve_spec("docling", "app", stored.spec.clone());

    let err = mock
        .patch_docling_serve_status("docling", "app", rv.as_deref(), &DoclingServeStatus::default())
        .await
        .expect_err("stale status patch should fail");
    assert!(err.is_conflict());

    let current = mock.docling_serve("docling", "app").expect("parent should exist");
    assert_eq!(current.metadata.generation, Some(2));
    mock.patch_docling_serve_status(
        "docling",
        "app",
        current.metadata.resource_version.as_deref(),
        &DoclingServeStatus::default(),
    )
    .await
    .expect("fresh status patch should succeed");
}

#[tokio::test]
async fn test_parent_deletion_cascades_to_owned_objects() {
    let mock = MockClusterClient::new();
    let parent = mock.add_docling_serve(docling_serve("app"));
    let uid = parent.metadata.uid.clone().expect("uid assigned");

    mock.create_deployment("docling", &deployment("app-deployment", Some(&uid)))
        .await
        .expect("owned create should succeed");
    mock.create_deployment("docling", &deployment("unrelated", None))
        .await
        .expect("unowned create should succeed");

    assert_eq!(mock.delete_docling_serve("docling", "app"), 1);
    assert!(mock.deployment("docling", "app-deployment").is_none());
    assert!(mock.deployment("docling", "unrelated").is_some());
}

#[tokio::test]
async fn test_writes_fill_in_server_defaults() {
    let mock = MockClusterClient::new();
    let mut route = Route::new(
        "app-route",
        RouteSpec {
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: "app-service".to_string(),
                weight: None,
            },
            ..Default::default()
        },
    );
    route.metadata.namespace = Some("docling".to_string());

    let created = mock.create_route("docling", &route).await.expect("create should succeed");
    assert_eq!(created.spec.to.weight, Some(100));
    assert_eq!(created.spec.host.as_deref(), Some("app-route-docling.apps.example.com"));

    // A replace that omits the defaulted fields gets them back
    let mut update = created.clone();
    update.spec.to.weight = None;
    let replaced = mock.replace_route("docling", &update).await.expect("replace should succeed");
    assert_eq!(replaced.spec.to.weight, Some(100));
    assert_eq!(replaced.spec.host, created.spec.host);
}
