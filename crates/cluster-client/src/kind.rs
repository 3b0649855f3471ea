//! Kinds the operator reads and writes

use std::fmt;

/// Every kind that goes through [`crate::ClusterClientTrait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    DoclingServe,
    ServiceAccount,
    Deployment,
    Service,
    Route,
}

impl ResourceKind {
    /// Kubernetes `kind` string
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoclingServe => "DoclingServe",
            Self::ServiceAccount => "ServiceAccount",
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::Route => "Route",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
