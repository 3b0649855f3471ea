//! Generic object storage for MockClusterClient
//!
//! Mimics the API server's bookkeeping: uid and resourceVersion assignment on
//! create, resourceVersion preconditions on replace, status preserved across
//! spec writes.

use super::{ObjectKey, lock};
use crate::error::ClusterError;
use crate::kind::ResourceKind;
use kube::Resource;
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) fn get<K: Resource + Clone>(
    objects: &Mutex<HashMap<ObjectKey, K>>,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) -> Result<K, ClusterError> {
    lock(objects)
        .get(&(namespace.to_string(), name.to_string()))
        .cloned()
        .ok_or_else(|| ClusterError::NotFound(format!("{} {}/{} not found", kind, namespace, name)))
}

pub(crate) fn create<K: Resource + Clone>(
    objects: &Mutex<HashMap<ObjectKey, K>>,
    kind: ResourceKind,
    namespace: &str,
    obj: &K,
    uid: String,
    resource_version: String,
) -> Result<K, ClusterError> {
    let name = obj.meta().name.clone().unwrap_or_default();
    if name.is_empty() {
        return Err(ClusterError::Api(format!("{} in {} has no name", kind, namespace)));
    }

    let mut objects = lock(objects);
    let key = (namespace.to_string(), name.clone());
    if objects.contains_key(&key) {
        return Err(ClusterError::Conflict(format!(
            "{} {}/{} already exists",
            kind, namespace, name
        )));
    }

    let mut stored = obj.clone();
    let meta = stored.meta_mut();
    meta.namespace = Some(namespace.to_string());
    meta.uid = Some(uid);
    meta.resource_version = Some(resource_version);
    meta.generation = Some(1);
    objects.insert(key, stored.clone());
    Ok(stored)
}

pub(crate) fn replace<K: Resource + Clone>(
    objects: &Mutex<HashMap<ObjectKey, K>>,
    kind: ResourceKind,
    namespace: &str,
    obj: &K,
    resource_version: String,
    keep_status: fn(&K, &mut K),
) -> Result<K, ClusterError> {
    let name = obj.meta().name.clone().unwrap_or_default();
    let mut objects = lock(objects);
    let key = (namespace.to_string(), name.clone());
    let Some(current) = objects.get(&key) else {
        return Err(ClusterError::NotFound(format!("{} {}/{} not found", kind, namespace, name)));
    };

    if let Some(expected) = obj.meta().resource_version.as_deref() {
        if current.meta().resource_version.as_deref() != Some(expected) {
            return Err(ClusterError::Conflict(format!(
                "Operation cannot be fulfilled on {} \"{}\": the object has been modified; \
                 please apply your changes to the latest version and try again",
                kind, name
            )));
        }
    }

    let mut stored = obj.clone();
    keep_status(current, &mut stored);
    let current_meta = current.meta().clone();
    let meta = stored.meta_mut();
    meta.namespace = Some(namespace.to_string());
    meta.uid = current_meta.uid;
    meta.generation = current_meta.generation;
    meta.resource_version = Some(resource_version);
    objects.insert(key, stored.clone());
    Ok(stored)
}

pub(crate) fn delete<K: Resource + Clone>(
    objects: &Mutex<HashMap<ObjectKey, K>>,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) -> Result<K, ClusterError> {
    lock(objects)
        .remove(&(namespace.to_string(), name.to_string()))
        .ok_or_else(|| ClusterError::NotFound(format!("{} {}/{} not found", kind, namespace, name)))
}

/// Removes every object whose owner references point at `owner_uid`.
pub(crate) fn collect_garbage<K: Resource + Clone>(objects: &Mutex<HashMap<ObjectKey, K>>, owner_uid: &str) -> usize {
    let mut objects = lock(objects);
    let before = objects.len();
    objects.retain(|_, obj| {
        !obj.meta()
            .owner_references
            .as_ref()
            .is_some_and(|refs| refs.iter().any(|r| r.uid == owner_uid))
    });
    before - objects.len()
}
