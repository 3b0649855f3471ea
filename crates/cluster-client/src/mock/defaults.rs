//! API server defaulting for MockClusterClient
//!
//! The API server (and, for Routes, the OpenShift route admission) fills in
//! unset fields on every create and replace. The mock does the same so that
//! reconcilers comparing desired against stored objects see what a real
//! cluster would return.

use crds::Route;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStrategy, RollingUpdateDeployment};
use k8s_openapi::api::core::v1::{Probe, Service};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub(crate) const DEFAULT_ROUTE_WEIGHT: i32 = 100;
pub(crate) const DEFAULT_CLUSTER_IP: &str = "10.96.0.10";

pub(crate) fn deployment(deployment: &mut Deployment) {
    let Some(spec) = deployment.spec.as_mut() else {
        return;
    };
    spec.replicas.get_or_insert(1);
    spec.revision_history_limit.get_or_insert(10);
    spec.progress_deadline_seconds.get_or_insert(600);
    spec.strategy.get_or_insert_with(|| DeploymentStrategy {
        type_: Some("RollingUpdate".to_string()),
        rolling_update: Some(RollingUpdateDeployment {
            max_surge: Some(IntOrString::String("25%".to_string())),
            max_unavailable: Some(IntOrString::String("25%".to_string())),
        }),
    });

    let Some(pod) = spec.template.spec.as_mut() else {
        return;
    };
    pod.restart_policy.get_or_insert_with(|| "Always".to_string());
    pod.dns_policy.get_or_insert_with(|| "ClusterFirst".to_string());
    pod.scheduler_name.get_or_insert_with(|| "default-scheduler".to_string());
    pod.termination_grace_period_seconds.get_or_insert(30);
    pod.security_context.get_or_insert_with(Default::default);

    for container in &mut pod.containers {
        container
            .termination_message_path
            .get_or_insert_with(|| "/dev/termination-log".to_string());
        container.termination_message_policy.get_or_insert_with(|| "File".to_string());
        for port in container.ports.iter_mut().flatten() {
            port.protocol.get_or_insert_with(|| "TCP".to_string());
        }
        for probe in [container.liveness_probe.as_mut(), container.readiness_probe.as_mut()]
            .into_iter()
            .flatten()
        {
            probe_defaults(probe);
        }
    }
}

fn probe_defaults(probe: &mut Probe) {
    probe.timeout_seconds.get_or_insert(1);
    probe.period_seconds.get_or_insert(10);
    probe.success_threshold.get_or_insert(1);
    probe.failure_threshold.get_or_insert(3);
    if let Some(http_get) = probe.http_get.as_mut() {
        http_get.scheme.get_or_insert_with(|| "HTTP".to_string());
    }
}

pub(crate) fn service(service: &mut Service) {
    let Some(spec) = service.spec.as_mut() else {
        return;
    };
    spec.type_.get_or_insert_with(|| "ClusterIP".to_string());
    spec.session_affinity.get_or_insert_with(|| "None".to_string());
    spec.internal_traffic_policy.get_or_insert_with(|| "Cluster".to_string());
    spec.cluster_ip.get_or_insert_with(|| DEFAULT_CLUSTER_IP.to_string());
    spec.cluster_ips.get_or_insert_with(|| vec![DEFAULT_CLUSTER_IP.to_string()]);
    spec.ip_families.get_or_insert_with(|| vec!["IPv4".to_string()]);
    spec.ip_family_policy.get_or_insert_with(|| "SingleStack".to_string());
    for port in spec.ports.iter_mut().flatten() {
        port.protocol.get_or_insert_with(|| "TCP".to_string());
        let number = port.port;
        port.target_port.get_or_insert(IntOrString::Int(number));
    }
}

/// Routes also get a host from the router's default domain when none is set.
pub(crate) fn route(route: &mut Route, namespace: &str) {
    route.spec.to.weight.get_or_insert(DEFAULT_ROUTE_WEIGHT);
    if route.spec.host.is_none() {
        let name = route.metadata.name.clone().unwrap_or_default();
        route.spec.host = Some(format!("{}-{}.apps.example.com", name, namespace));
    }
}
