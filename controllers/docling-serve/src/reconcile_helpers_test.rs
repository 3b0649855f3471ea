//! Unit tests for reconcile_helpers module

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::reconcile_helpers::*;
    use crate::test_utils::create_test_docling_serve;
    use cluster_client::ClusterError;
    use k8s_openapi::api::core::v1::ServiceAccount;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    #[test]
    fn test_labels_and_names() {
        let docling_serve = create_test_docling_serve("docling", "default");

        let labels = labels_for("docling");
        assert_eq!(labels.get("app").map(String::as_str), Some("docling-serve"));
        assert_eq!(labels.get("doclingserve_cr").map(String::as_str), Some("docling"));

        assert_eq!(service_account_name(&docling_serve), "docling-serviceaccount");
        assert_eq!(deployment_name(&docling_serve), "docling-deployment");
        assert_eq!(service_name(&docling_serve), "docling-service");
        assert_eq!(route_name(&docling_serve), "docling-route");
    }

    #[test]
    fn test_namespace_required() {
        let mut docling_serve = create_test_docling_serve("docling", "default");
        docling_serve.metadata.namespace = None;
        assert!(matches!(
            namespace_of(&docling_serve),
            Err(ControllerError::MissingObjectKey("metadata.namespace"))
        ));
    }

    #[test]
    fn test_set_controller_reference_is_idempotent() {
        let owner = create_test_docling_serve("docling", "default");
        let mut service_account = ServiceAccount::default();

        set_controller_reference(&owner, &mut service_account).expect("first");
        set_controller_reference(&owner, &mut service_account).expect("second");

        let refs = service_account.metadata.owner_references.expect("owner refs");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, "DoclingServe");
        assert_eq!(refs[0].api_version, "docling.github.io/v1alpha1");
        assert_eq!(refs[0].name, "docling");
        assert_eq!(refs[0].uid, "docling-uid");
        assert_eq!(refs[0].controller, Some(true));
        assert_eq!(refs[0].block_owner_deletion, Some(true));
    }

    #[test]
    fn test_set_controller_reference_keeps_other_owners() {
        let owner = create_test_docling_serve("docling", "default");
        let mut service_account = ServiceAccount::default();
        service_account.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            name: "bundle".to_string(),
            uid: "cm-uid".to_string(),
            ..Default::default()
        }]);

        set_controller_reference(&owner, &mut service_account).expect("non-controller owners coexist");

        assert_eq!(service_account.metadata.owner_references.map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_set_controller_reference_rejects_foreign_controller() {
        let owner = create_test_docling_serve("docling", "default");
        let other = create_test_docling_serve("other", "default");
        let mut service_account = ServiceAccount::default();
        set_controller_reference(&other, &mut service_account).expect("first owner");

        let result = set_controller_reference(&owner, &mut service_account);

        assert!(matches!(result, Err(ControllerError::Reconciliation(_))));
    }

    #[test]
    fn test_set_controller_reference_needs_uid() {
        let mut owner = create_test_docling_serve("docling", "default");
        owner.metadata.uid = None;
        let mut service_account = ServiceAccount::default();

        assert!(matches!(
            set_controller_reference(&owner, &mut service_account),
            Err(ControllerError::MissingObjectKey(_))
        ));
    }

    fn named(name: &str) -> ServiceAccount {
        let mut service_account = ServiceAccount::default();
        service_account.metadata.name = Some(name.to_string());
        service_account
    }

    fn label(service_account: &mut ServiceAccount) -> Result<(), ControllerError> {
        service_account.metadata.labels = Some(labels_for("docling"));
        Ok(())
    }

    #[test]
    fn test_plan_creates_on_not_found() {
        let plan = plan_create_or_update(
            Err(ClusterError::NotFound("missing".to_string())),
            || named("fresh"),
            label,
        )
        .expect("plan");

        let Plan::Create(created) = plan else {
            panic!("expected create, got {:?}", plan);
        };
        assert_eq!(created.metadata.name.as_deref(), Some("fresh"));
        assert!(created.metadata.labels.is_some());
    }

    #[test]
    fn test_plan_updates_or_leaves_alone() {
        let plan = plan_create_or_update(Ok(named("existing")), || named("unused"), label).expect("plan");
        assert!(matches!(plan, Plan::Update(_)));
        assert_eq!(Applied::from(&plan), Applied::Updated);

        let mut converged = named("existing");
        label(&mut converged).expect("label");
        let plan = plan_create_or_update(Ok(converged), || named("unused"), label).expect("plan");
        assert!(matches!(plan, Plan::Unchanged(_)));
        assert!(!Applied::from(&plan).mutated());
    }

    #[test]
    fn test_plan_propagates_other_read_errors() {
        let result = plan_create_or_update(
            Err(ClusterError::Api("forbidden".to_string())),
            || named("unused"),
            label,
        );
        assert!(matches!(result, Err(ControllerError::Cluster(ClusterError::Api(_)))));
    }
}
