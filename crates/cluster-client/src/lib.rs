//! Cluster Client
//!
//! Typed access to the Kubernetes objects the docling operator reads and writes:
//! its own `DoclingServe` resources and the ServiceAccounts, Deployments,
//! Services and Routes it manages for them.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::try_default().await?;
//!
//! match client.get_deployment("docling", "my-docling-deployment").await {
//!     Ok(deployment) => println!("replicas: {:?}", deployment.spec.and_then(|s| s.replicas)),
//!     Err(e) if e.is_not_found() => println!("not created yet"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Error classification**: 404 and 409 responses surface as
//!   `ClusterError::NotFound` and `ClusterError::Conflict`
//! - **Optimistic concurrency**: replaces and status patches carry `resourceVersion`
//! - **`test-util`**: an in-memory `MockClusterClient` with failure injection,
//!   owner-reference cascade and write counters

pub mod client;
pub mod error;
pub mod kind;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
pub use kind::ResourceKind;
#[cfg(feature = "test-util")]
pub use mock::{InjectedFailure, MockClusterClient};
