//! Cluster metadata.
//!
//! - [`endpoint`]: resolved / unresolved network targets and their identity
//! - [`node`]: cluster members and their liveness
//! - [`registry`]: the published, read-only node registry
//! - [`reconciler`]: merges topology snapshots into the registry

pub mod endpoint;
pub mod node;
pub mod reconciler;
pub mod registry;

pub use endpoint::{Endpoint, EndpointId};
pub use node::{Node, NodeInstance, NodeState};
pub use reconciler::{MergeOutcome, NodeEvent, TopologyReconciler, TopologySnapshot};
pub use registry::{Metadata, NodeRegistry};
