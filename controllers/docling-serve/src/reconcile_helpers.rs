//! Helper functions for common reconciliation patterns
//!
//! Naming and labelling of owned objects, controller references, and the
//! create-or-update decision shared by every sub-resource reconciler.

use crate::error::ControllerError;
use cluster_client::ClusterError;
use crds::DoclingServe;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::fmt;

/// Value of the `app` label on every owned object
pub const APP_LABEL: &str = "docling-serve";
/// Label carrying the owning DoclingServe's name
pub const INSTANCE_LABEL: &str = "doclingserve_cr";

/// Labels identifying the objects owned by the DoclingServe `name`
pub fn labels_for(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), APP_LABEL.to_string()),
        (INSTANCE_LABEL.to_string(), name.to_string()),
    ])
}

pub fn service_account_name(docling_serve: &DoclingServe) -> String {
    format!("{}-serviceaccount", docling_serve.name_any())
}

pub fn deployment_name(docling_serve: &DoclingServe) -> String {
    format!("{}-deployment", docling_serve.name_any())
}

pub fn service_name(docling_serve: &DoclingServe) -> String {
    format!("{}-service", docling_serve.name_any())
}

pub fn route_name(docling_serve: &DoclingServe) -> String {
    format!("{}-route", docling_serve.name_any())
}

/// Namespace of a DoclingServe, which every owned object shares
pub fn namespace_of(docling_serve: &DoclingServe) -> Result<String, ControllerError> {
    docling_serve
        .namespace()
        .ok_or(ControllerError::MissingObjectKey("metadata.namespace"))
}

/// Mark `obj` as controlled by `owner` so it is garbage-collected with it.
///
/// An existing reference to the same owner is refreshed in place. Fails when
/// another object already holds the controller reference.
pub fn set_controller_reference<K: Resource>(owner: &DoclingServe, obj: &mut K) -> Result<(), ControllerError> {
    let mut owner_ref = owner
        .controller_owner_ref(&())
        .ok_or(ControllerError::MissingObjectKey("metadata.uid"))?;
    // Foreground deletion of the owner waits for this object
    owner_ref.block_owner_deletion = Some(true);

    let refs = obj.meta_mut().owner_references.get_or_insert_with(Vec::new);
    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(ControllerError::Reconciliation(format!(
            "object is already controlled by {} {}",
            other.kind, other.name
        )));
    }

    match refs.iter_mut().find(|r| r.uid == owner_ref.uid) {
        Some(existing) => *existing = owner_ref,
        None => refs.push(owner_ref),
    }
    Ok(())
}

/// Write to perform after comparing the desired object with the stored one
#[derive(Debug, Clone, PartialEq)]
pub enum Plan<K> {
    /// Object does not exist yet
    Create(K),
    /// Object exists and differs from the desired state
    Update(K),
    /// Object already matches; no write
    Unchanged(K),
}

/// Decide how to converge an object.
///
/// `existing` is the read of the stored object. On NotFound the object is
/// built from `init` (which sets name and namespace only). `mutate` then
/// applies the desired fields to either the fresh or the fetched object; it
/// must be deterministic so that a converged object compares equal. Any
/// other read error is returned unchanged.
pub fn plan_create_or_update<K, I, M>(
    existing: Result<K, ClusterError>,
    init: I,
    mutate: M,
) -> Result<Plan<K>, ControllerError>
where
    K: Clone + PartialEq,
    I: FnOnce() -> K,
    M: FnOnce(&mut K) -> Result<(), ControllerError>,
{
    match existing {
        Ok(current) => {
            let mut desired = current.clone();
            mutate(&mut desired)?;
            if desired == current {
                Ok(Plan::Unchanged(desired))
            } else {
                Ok(Plan::Update(desired))
            }
        }
        Err(e) if e.is_not_found() => {
            let mut desired = init();
            mutate(&mut desired)?;
            Ok(Plan::Create(desired))
        }
        Err(e) => Err(e.into()),
    }
}

/// What a sub-resource reconciler did to its object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Updated,
    Unchanged,
    Deleted,
    Absent,
}

impl Applied {
    /// Whether the store was written
    pub fn mutated(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }
}

impl<K> From<&Plan<K>> for Applied {
    fn from(plan: &Plan<K>) -> Self {
        match plan {
            Plan::Create(_) => Self::Created,
            Plan::Update(_) => Self::Updated,
            Plan::Unchanged(_) => Self::Unchanged,
        }
    }
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Deleted => "deleted",
            Self::Absent => "absent",
        };
        f.write_str(s)
    }
}
