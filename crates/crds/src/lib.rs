//! Docling Operator CRD Definitions
//!
//! Kubernetes Custom Resource Definitions owned by the docling operator,
//! plus the typed OpenShift `Route` it manages on behalf of a `DoclingServe`.

pub mod condition;
pub mod docling_serve;
pub mod route;

pub use condition::*;
pub use docling_serve::*;
pub use route::*;
