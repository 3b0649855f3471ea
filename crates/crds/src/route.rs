//! OpenShift Route
//!
//! Typed view of `route.openshift.io/v1` Routes. The kind is served by the
//! OpenShift API server; only the fields the operator writes or reads are modelled.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    namespaced,
    status = "RouteStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Host alias; assigned by the router when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Path the router matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Backend the route points to
    pub to: RouteTargetReference,

    /// Port on the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<RoutePort>,

    /// TLS settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteTargetReference {
    /// Always `Service` for this operator
    pub kind: String,

    /// Name of the backend
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutePort {
    pub target_port: TargetPort,
}

/// Named or numeric backend port
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum TargetPort {
    Number(i32),
    Name(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    pub termination: TlsTermination,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_edge_termination_policy: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TlsTermination {
    /// TLS terminated at the router
    #[default]
    Edge,
    Passthrough,
    Reencrypt,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    /// One entry per router that has seen the route
    #[serde(default)]
    pub ingress: Vec<RouteIngress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_name: Option<String>,

    #[serde(default)]
    pub conditions: Vec<RouteIngressCondition>,
}

/// Router-reported condition, e.g. `Admitted`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngressCondition {
    pub r#type: String,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_port_accepts_name_or_number() {
        let named: RoutePort = serde_json::from_value(serde_json::json!({ "targetPort": "http" }))
            .expect("named port should deserialize");
        assert_eq!(named.target_port, TargetPort::Name("http".to_string()));

        let numbered: RoutePort = serde_json::from_value(serde_json::json!({ "targetPort": 5001 }))
            .expect("numeric port should deserialize");
        assert_eq!(numbered.target_port, TargetPort::Number(5001));
    }

    #[test]
    fn test_route_status_from_router() {
        let status: RouteStatus = serde_json::from_value(serde_json::json!({
            "ingress": [{
                "host": "docling.apps.example.com",
                "routerName": "default",
                "conditions": [{ "type": "Admitted", "status": "True" }]
            }]
        }))
        .expect("status should deserialize");

        assert_eq!(status.ingress[0].conditions[0].r#type, "Admitted");
        assert!(status.ingress[0].conditions[0].reason.is_none());
    }
}
