//! Status conditions
//!
//! Typed, timestamped observations attached to a resource's status,
//! following the Kubernetes `metav1.Condition` layout.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single observation about one aspect of a resource.
///
/// A status holds at most one condition per `type`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type in CamelCase, e.g. `DeploymentAvailable`
    pub r#type: String,

    /// True, False or Unknown
    pub status: ConditionStatus,

    /// Machine-readable CamelCase reason for the last transition; never empty
    pub reason: String,

    /// Human-readable detail
    #[serde(default)]
    pub message: String,

    /// Generation of the owning resource this condition was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time `status` changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    /// Builds a condition without a transition time; the time is stamped when
    /// the condition is merged into a status.
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            r#type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            observed_generation: None,
            last_transition_time: None,
        }
    }

    /// Sets `observed_generation`.
    #[must_use]
    pub fn observed(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl ConditionStatus {
    /// Parses the string form used by built-in Kubernetes conditions.
    /// Anything other than `True`/`False` maps to `Unknown`.
    pub fn from_k8s(status: &str) -> Self {
        match status {
            "True" => Self::True,
            "False" => Self::False,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_wire_format() {
        let condition = Condition::new("DeploymentCreated", ConditionStatus::True, "DeploymentCreated", "ok")
            .observed(Some(3));
        let value = serde_json::to_value(&condition).expect("condition should serialize");

        assert_eq!(value["type"], "DeploymentCreated");
        assert_eq!(value["status"], "True");
        assert_eq!(value["observedGeneration"], 3);
        assert!(value.get("lastTransitionTime").is_none());
    }

    #[test]
    fn test_status_from_k8s() {
        assert_eq!(ConditionStatus::from_k8s("True"), ConditionStatus::True);
        assert_eq!(ConditionStatus::from_k8s("False"), ConditionStatus::False);
        assert_eq!(ConditionStatus::from_k8s(""), ConditionStatus::Unknown);
        assert_eq!(ConditionStatus::from_k8s("Unknown").to_string(), "Unknown");
    }
}
