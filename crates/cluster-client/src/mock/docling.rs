//! DoclingServe operations for MockClusterClient
//!
//! Test setup for the parent resource, conflict-checked status patches, and
//! the garbage collector's cascade on parent deletion.

use super::{MockClusterClient, lock, store};
use crate::error::ClusterError;
use crate::kind::ResourceKind;
use crds::{DoclingServe, DoclingServeSpec, DoclingServeStatus};

impl MockClusterClient {
    /// Store a DoclingServe as if a user had applied it.
    ///
    /// Fills in uid, resourceVersion and generation 1; returns the stored copy.
    pub fn add_docling_serve(&self, docling_serve: DoclingServe) -> DoclingServe {
        let version = self.next_version();
        let mut stored = docling_serve;
        let namespace = stored.metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
        let name = stored.metadata.name.clone().unwrap_or_default();
        stored.metadata.namespace = Some(namespace.clone());
        stored.metadata.uid.get_or_insert_with(|| format!("uid-{}", version));
        stored.metadata.resource_version = Some(version.to_string());
        stored.metadata.generation.get_or_insert(1);
        lock(&self.docling_serves).insert((namespace, name), stored.clone());
        stored
    }

    /// Stored DoclingServe, if any
    pub fn docling_serve(&self, namespace: &str, name: &str) -> Option<DoclingServe> {
        store::get(&self.docling_serves, ResourceKind::DoclingServe, namespace, name).ok()
    }

    /// Change the spec as a user would; bumps generation and resourceVersion.
    pub fn update_docling_serve_spec(&self, namespace: &str, name: &str, spec: DoclingServeSpec) {
        let version = self.next_version();
        if let Some(stored) = lock(&self.docling_serves).get_mut(&(namespace.to_string(), name.to_string())) {
            stored.spec = spec;
            stored.metadata.generation = Some(stored.metadata.generation.unwrap_or(0) + 1);
            stored.metadata.resource_version = Some(version.to_string());
        }
    }

    /// Delete a DoclingServe and everything that carries an owner reference to it.
    ///
    /// Returns the number of dependents collected.
    pub fn delete_docling_serve(&self, namespace: &str, name: &str) -> usize {
        let Ok(removed) = store::delete(&self.docling_serves, ResourceKind::DoclingServe, namespace, name) else {
            return 0;
        };
        let Some(uid) = removed.metadata.uid else {
            return 0;
        };

        store::collect_garbage(&self.service_accounts, &uid)
            + store::collect_garbage(&self.deployments, &uid)
            + store::collect_garbage(&self.services, &uid)
            + store::collect_garbage(&self.routes, &uid)
    }
}

pub(crate) fn patch_status(
    client: &MockClusterClient,
    namespace: &str,
    name: &str,
    resource_version: Option<&str>,
    status: &DoclingServeStatus,
) -> Result<DoclingServe, ClusterError> {
    client.check_write(ResourceKind::DoclingServe, "patch status")?;
    let version = client.next_version();

    let mut objects = lock(&client.docling_serves);
    let Some(stored) = objects.get_mut(&(namespace.to_string(), name.to_string())) else {
        return Err(ClusterError::NotFound(format!("DoclingServe {}/{} not found", namespace, name)));
    };
    if let Some(expected) = resource_version {
        if stored.metadata.resource_version.as_deref() != Some(expected) {
            return Err(ClusterError::Conflict(format!(
                "Operation cannot be fulfilled on doclingserves \"{}\": the object has been modified",
                name
            )));
        }
    }

    stored.status = Some(status.clone());
    stored.metadata.resource_version = Some(version.to_string());
    let updated = stored.clone();
    drop(objects);

    client.record_mutation(ResourceKind::DoclingServe);
    Ok(updated)
}
