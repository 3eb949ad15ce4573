//! Cluster members as seen by the client.

use super::endpoint::{Endpoint, EndpointId};
use std::fmt;
use time::OffsetDateTime;

/// Liveness of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Not observed yet.
    #[default]
    Unknown,
    Up,
    Down,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeState::Unknown => "UNKNOWN",
            NodeState::Up => "UP",
            NodeState::Down => "DOWN",
        };
        f.write_str(label)
    }
}

/// Distinguishes two nodes that share an endpoint but were created separately,
/// e.g. a node re-discovered after it had been evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeInstance(pub(crate) u64);

/// One cluster member.
///
/// Nodes are immutable; the reconciler publishes a new value whenever the
/// state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    instance: NodeInstance,
    endpoint: Endpoint,
    state: NodeState,
    up_since: Option<OffsetDateTime>,
}

impl Node {
    pub(crate) fn new(instance: NodeInstance, endpoint: Endpoint) -> Self {
        Self {
            instance,
            endpoint,
            state: NodeState::Unknown,
            up_since: None,
        }
    }

    pub fn instance(&self) -> NodeInstance {
        self.instance
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn id(&self) -> EndpointId {
        self.endpoint.id()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_up(&self) -> bool {
        self.state == NodeState::Up
    }

    /// When the node was last seen coming up; `None` if it is not up.
    pub fn up_since(&self) -> Option<OffsetDateTime> {
        self.up_since
    }

    /// `up_since` as milliseconds since the Unix epoch.
    pub fn up_since_millis(&self) -> Option<i64> {
        self.up_since
            .map(|at| (at.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    /// Up transition. An already-up node keeps its original timestamp.
    pub(crate) fn mark_up(&self, now: OffsetDateTime) -> Self {
        let up_since = match self.state {
            NodeState::Up => self.up_since.or(Some(now)),
            NodeState::Unknown | NodeState::Down => Some(now),
        };
        Self {
            state: NodeState::Up,
            up_since,
            ..self.clone()
        }
    }

    pub(crate) fn mark_down(&self) -> Self {
        Self {
            state: NodeState::Down,
            up_since: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node(endpoint={}, state={}, instance={})",
            self.endpoint, self.state, self.instance.0
        )
    }
}
