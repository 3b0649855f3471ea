//! Test utilities for unit testing reconcilers
//!
//! Builders for DoclingServe fixtures and a reconciler wired to the
//! in-memory cluster store.

use crate::reconciler::{PassContext, Reconciler};
use cluster_client::MockClusterClient;
use crds::{ApiServer, Condition, DoclingServe, DoclingServeSpec, Engine, KfpEngine, LocalEngine, RouteExposure};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub const TEST_IMAGE: &str = "quay.io/docling-project/docling-serve:latest";

/// DoclingServe with a local engine, one instance and no route
pub fn create_test_docling_serve(name: &str, namespace: &str) -> DoclingServe {
    DoclingServe {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("{}-uid", name)),
            generation: Some(1),
            ..Default::default()
        },
        spec: test_spec(),
        status: None,
    }
}

pub fn test_spec() -> DoclingServeSpec {
    DoclingServeSpec {
        api_server: ApiServer {
            image: TEST_IMAGE.to_string(),
            enable_ui: false,
            instances: 1,
            config_map_name: None,
        },
        engine: Engine {
            local: Some(LocalEngine::default()),
            kfp: None,
        },
        route: None,
    }
}

/// Spec with the route toggled
pub fn with_route(mut spec: DoclingServeSpec, enabled: bool) -> DoclingServeSpec {
    spec.route = Some(RouteExposure { enabled });
    spec
}

/// Spec running a KFP engine instead of the local one
pub fn with_kfp_engine(mut spec: DoclingServeSpec, endpoint: &str) -> DoclingServeSpec {
    spec.engine = Engine {
        local: None,
        kfp: Some(KfpEngine {
            endpoint: endpoint.to_string(),
        }),
    };
    spec
}

/// Store `spec` as DoclingServe `namespace/name` and return a reconciler over the same store
pub fn setup(mock: &MockClusterClient, namespace: &str, name: &str, spec: DoclingServeSpec) -> Reconciler {
    let mut docling_serve = create_test_docling_serve(name, namespace);
    docling_serve.metadata.uid = None;
    docling_serve.spec = spec;
    mock.add_docling_serve(docling_serve);
    Reconciler::new(mock.clone())
}

pub fn test_context(namespace: &str, name: &str) -> PassContext {
    PassContext::new(namespace, name)
}

/// Condition of `condition_type`, if present
pub fn find_status_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}
