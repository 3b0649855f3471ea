//! Unit tests for status projection and commit

#[cfg(test)]
mod tests {
    use super::super::status::*;
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};
    use cluster_client::{ClusterError, InjectedFailure, MockClusterClient, ResourceKind};
    use crds::{ConditionStatus, RouteIngress, RouteIngressCondition, RouteStatus};
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};
    use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus, Service, ServiceStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition as MetaCondition;
    use std::sync::Arc;

    fn deployment_condition(type_: &str, status: &str, reason: Option<&str>) -> DeploymentCondition {
        DeploymentCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: reason.map(str::to_string),
            message: Some(format!("{} is {}", type_, status)),
            ..Default::default()
        }
    }

    #[test]
    fn test_fetch_failure_projects_unknown() {
        let conditions = deployment_conditions(&Err(ClusterError::NotFound("deployment missing".to_string())));

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].r#type, "DeploymentCreated");
        assert_eq!(conditions[0].status, ConditionStatus::Unknown);
        assert_eq!(conditions[0].reason, "DeploymentStatusError");
        assert!(conditions[0].message.contains("deployment missing"));

        let conditions = route_conditions(&Err(ClusterError::Api("forbidden".to_string())));
        assert_eq!(conditions[0].reason, "RouteStatusError");
    }

    #[test]
    fn test_deployment_without_status_projects_nothing() {
        assert!(deployment_conditions(&Ok(Deployment::default())).is_empty());
    }

    #[test]
    fn test_deployment_available_and_latest() {
        let deployment = Deployment {
            status: Some(DeploymentStatus {
                conditions: Some(vec![
                    deployment_condition("Available", "True", Some("MinimumReplicasAvailable")),
                    deployment_condition("Progressing", "True", None),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let conditions = deployment_conditions(&Ok(deployment));
        let types: Vec<&str> = conditions.iter().map(|c| c.r#type.as_str()).collect();
        assert_eq!(types, vec![DEPLOYMENT_CREATED, DEPLOYMENT_AVAILABLE, "Progressing"]);
        assert_eq!(conditions[1].status, ConditionStatus::True);
        assert_eq!(conditions[1].reason, "MinimumReplicasAvailable");
        // Empty reasons are substituted when merged
        assert_eq!(conditions[2].reason, "");
    }

    #[test]
    fn test_service_load_balancer() {
        let mut service = Service {
            status: Some(ServiceStatus::default()),
            ..Default::default()
        };
        let types: Vec<String> = service_conditions(&Ok(service.clone())).into_iter().map(|c| c.r#type).collect();
        assert_eq!(types, vec![SERVICE_CREATED.to_string()]);

        service.status = Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    ip: Some("203.0.113.7".to_string()),
                    ..Default::default()
                }]),
            }),
            conditions: Some(vec![serde_json::from_value::<MetaCondition>(serde_json::json!({
                "type": "LoadBalancerPortsError",
                "status": "False",
                "reason": "LoadBalancerMixedProtocolNotSupported",
                "message": "",
                "lastTransitionTime": "2024-05-01T12:00:00Z",
            }))
            .expect("valid condition")]),
        });
        let conditions = service_conditions(&Ok(service));
        let types: Vec<&str> = conditions.iter().map(|c| c.r#type.as_str()).collect();
        assert_eq!(types, vec![SERVICE_CREATED, LOAD_BALANCER_ASSIGNED, "LoadBalancerPortsError"]);
        assert_eq!(conditions[2].status, ConditionStatus::False);
    }

    #[test]
    fn test_route_passes_through_first_ingress() {
        let route = crds::Route {
            metadata: Default::default(),
            spec: Default::default(),
            status: Some(RouteStatus {
                ingress: vec![RouteIngress {
                    host: Some("docling.apps.example.com".to_string()),
                    router_name: Some("default".to_string()),
                    conditions: vec![RouteIngressCondition {
                        r#type: "Admitted".to_string(),
                        status: "True".to_string(),
                        reason: None,
                        message: None,
                        last_transition_time: None,
                    }],
                }],
            }),
        };

        let conditions = route_conditions(&Ok(route));
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].message, "A docling route was created successfully");
        assert_eq!(conditions[1].r#type, "Admitted");
        assert_eq!(conditions[1].status, ConditionStatus::True);
    }

    #[tokio::test]
    async fn test_project_route_disabled_skips_fetch() {
        let mock = MockClusterClient::new();
        mock.fail_reads(ResourceKind::Route, InjectedFailure::Api("should not be read".to_string()));
        let reconciler = StatusReconciler::new(Arc::new(mock.clone()));
        let mut docling_serve = create_test_docling_serve("docling", "default");
        docling_serve.metadata.generation = Some(4);
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid timestamp");

        reconciler
            .project(&test_context("default", "docling"), &mut docling_serve, now)
            .await;

        let status = docling_serve.status.expect("status projected");
        assert_eq!(status.observed_generation, Some(4));
        let route = find_status_condition(&status.conditions, ROUTE_CREATED).expect("route condition");
        assert_eq!(route.status, ConditionStatus::True);
        assert_eq!(route.reason, ROUTE_DISABLED_REASON);
        assert_eq!(route.message, "A docling route is disabled");
        assert_eq!(route.observed_generation, Some(4));

        // Nothing exists yet: both fetches fail into Unknown
        let deployment = find_status_condition(&status.conditions, DEPLOYMENT_CREATED).expect("deployment condition");
        assert_eq!(deployment.status, ConditionStatus::Unknown);
        assert_eq!(deployment.last_transition_time, Some(now));
    }

    #[tokio::test]
    async fn test_commit_skips_unchanged_status() {
        let mock = MockClusterClient::new();
        let parent = mock.add_docling_serve(create_test_docling_serve("docling", "default"));
        let reconciler = StatusReconciler::new(Arc::new(mock.clone()));
        let ctx = test_context("default", "docling");

        let result = reconciler.commit(&ctx, &parent, &parent.clone()).await;

        assert!(!result.requeue && result.error.is_none());
        assert_eq!(mock.mutation_count(ResourceKind::DoclingServe), 0);
    }

    #[tokio::test]
    async fn test_commit_conflict_requeues() {
        let mock = MockClusterClient::new();
        let parent = mock.add_docling_serve(create_test_docling_serve("docling", "default"));
        mock.update_docling_serve_spec("default", "docling", with_route(test_spec(), true));
        let reconciler = StatusReconciler::new(Arc::new(mock.clone()));
        let ctx = test_context("default", "docling");
        let mut working = parent.clone();
        reconciler.project(&ctx, &mut working, Utc::now()).await;

        let result = reconciler.commit(&ctx, &parent, &working).await;

        assert!(result.requeue);
        assert!(result.error.as_ref().is_some_and(|e| e.is_conflict()));
        assert!(mock.docling_serve("default", "docling").and_then(|d| d.status).is_none());
    }
}
