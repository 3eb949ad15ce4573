//! Topology reconciliation.
//!
//! The [`TopologyReconciler`] is the only writer of the [`NodeRegistry`].
//! Snapshots and liveness events are applied one at a time under a mutex;
//! each application builds a complete new [`Metadata`] and publishes it with
//! a single pointer swap.
//!
//! # Merge rules
//!
//! 1. Repeated identities inside one snapshot keep their first occurrence.
//! 2. Nodes present in both the registry and the snapshot are retained as-is.
//! 3. Nodes missing from the snapshot are evicted. Eviction is terminal.
//! 4. New identities become `Unknown` nodes, unless the hostname they trace to
//!    is already represented in the other form (see [`Endpoint::hostname_trace`]).
//!    Retained nodes are placed before new ones, so the established form wins.
//!
//! Snapshots carry a sequence number; anything not newer than the last
//! applied snapshot is dropped so an old view cannot resurrect an evicted node.

use super::endpoint::{Endpoint, EndpointId};
use super::node::{Node, NodeInstance};
use super::registry::{Metadata, NodeRegistry};
use crate::dns::Name;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Cluster membership as reported by the control connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySnapshot {
    pub sequence: u64,
    pub endpoints: Vec<Endpoint>,
}

impl TopologySnapshot {
    pub fn new(sequence: u64, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            sequence,
            endpoints: endpoints.into_iter().collect(),
        }
    }
}

/// Liveness observation for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    Up(EndpointId),
    Down(EndpointId),
}

impl NodeEvent {
    pub fn id(&self) -> &EndpointId {
        match self {
            NodeEvent::Up(id) | NodeEvent::Down(id) => id,
        }
    }
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: Vec<EndpointId>,
    pub retained: usize,
    pub evicted: Vec<EndpointId>,
    /// New identities skipped because their hostname already had a node.
    pub suppressed: Vec<EndpointId>,
    /// Repeated identities dropped from the snapshot.
    pub duplicates: usize,
    /// The snapshot was not newer than the last one applied and was ignored.
    pub stale: bool,
}

impl MergeOutcome {
    fn stale() -> Self {
        Self {
            stale: true,
            ..Default::default()
        }
    }

    /// Membership did not change.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.evicted.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Resolved,
    Unresolved,
}

#[derive(Debug, Default)]
struct WriterState {
    last_sequence: Option<u64>,
    next_instance: u64,
}

impl WriterState {
    fn next_instance(&mut self) -> NodeInstance {
        self.next_instance += 1;
        NodeInstance(self.next_instance)
    }
}

/// Single writer for the node registry.
#[derive(Debug, Default)]
pub struct TopologyReconciler {
    registry: NodeRegistry,
    writer: Mutex<WriterState>,
}

impl TopologyReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only handle for everyone else.
    pub fn registry(&self) -> NodeRegistry {
        self.registry.clone()
    }

    pub fn metadata(&self) -> Arc<Metadata> {
        self.registry.snapshot()
    }

    /// Sequence of the last snapshot applied.
    pub fn last_sequence(&self) -> Option<u64> {
        self.writer.lock().last_sequence
    }

    /// Merge a topology snapshot. Never fails.
    pub fn merge(&self, snapshot: TopologySnapshot) -> MergeOutcome {
        let mut writer = self.writer.lock();

        if let Some(last) = writer.last_sequence {
            if snapshot.sequence <= last {
                warn!(
                    sequence = snapshot.sequence,
                    last_applied = last,
                    "ignoring out-of-order topology snapshot"
                );
                return MergeOutcome::stale();
            }
        }

        let current = self.registry.snapshot();
        let mut outcome = MergeOutcome::default();

        let mut seen = HashSet::with_capacity(snapshot.endpoints.len());
        let mut unique = Vec::with_capacity(snapshot.endpoints.len());
        for endpoint in snapshot.endpoints {
            if seen.insert(endpoint.id()) {
                unique.push(endpoint);
            } else {
                warn!(
                    endpoint = %endpoint,
                    sequence = snapshot.sequence,
                    "duplicate endpoint in topology snapshot, keeping first occurrence"
                );
                outcome.duplicates += 1;
            }
        }

        let mut next: HashMap<EndpointId, Arc<Node>> = HashMap::with_capacity(unique.len());
        let mut traces: HashMap<(Name, u16), Form> = HashMap::new();
        let mut fresh = Vec::new();

        for endpoint in unique {
            let id = endpoint.id();
            match current.get(&id) {
                Some(node) => {
                    record_trace(&mut traces, node.endpoint());
                    next.insert(id, Arc::clone(node));
                    outcome.retained += 1;
                }
                None => fresh.push(endpoint),
            }
        }

        for (id, node) in current.nodes() {
            if !seen.contains(id) {
                info!(node = %node, "evicting node missing from topology");
                outcome.evicted.push(id.clone());
            }
        }

        for endpoint in fresh {
            let id = endpoint.id();
            if let Some(existing) = conflicting_form(&traces, &endpoint) {
                debug!(
                    endpoint = %endpoint,
                    existing = ?existing,
                    "hostname already represented, suppressing new node"
                );
                outcome.suppressed.push(id);
                continue;
            }
            record_trace(&mut traces, &endpoint);
            let node = Node::new(writer.next_instance(), endpoint);
            info!(node = %node, "adding node");
            next.insert(id.clone(), Arc::new(node));
            outcome.added.push(id);
        }

        writer.last_sequence = Some(snapshot.sequence);
        self.registry.publish(Metadata::new(Some(snapshot.sequence), next));

        debug!(
            sequence = snapshot.sequence,
            unchanged = outcome.is_noop(),
            added = outcome.added.len(),
            retained = outcome.retained,
            evicted = outcome.evicted.len(),
            suppressed = outcome.suppressed.len(),
            "topology merged"
        );
        outcome
    }

    /// Apply a liveness event. Returns false when the node is unknown.
    pub fn on_node_event(&self, event: NodeEvent) -> bool {
        self.on_node_event_at(event, OffsetDateTime::now_utc())
    }

    pub(crate) fn on_node_event_at(&self, event: NodeEvent, now: OffsetDateTime) -> bool {
        let _writer = self.writer.lock();
        let current = self.registry.snapshot();

        let Some(node) = current.get(event.id()) else {
            debug!(endpoint = %event.id(), "ignoring event for unknown node");
            return false;
        };

        let updated = match &event {
            NodeEvent::Up(_) => node.mark_up(now),
            NodeEvent::Down(_) => node.mark_down(),
        };
        if updated == **node {
            return true;
        }
        debug!(node = %updated, "node state changed");

        let mut nodes = current.nodes().clone();
        nodes.insert(event.id().clone(), Arc::new(updated));
        self.registry.publish(Metadata::new(current.sequence(), nodes));
        true
    }
}

fn record_trace(traces: &mut HashMap<(Name, u16), Form>, endpoint: &Endpoint) {
    if let Some((name, port)) = endpoint.hostname_trace() {
        traces
            .entry((name.clone(), port))
            .or_insert_with(|| form_of(endpoint));
    }
}

fn conflicting_form(traces: &HashMap<(Name, u16), Form>, endpoint: &Endpoint) -> Option<Form> {
    let (name, port) = endpoint.hostname_trace()?;
    let existing = *traces.get(&(name.clone(), port))?;
    (existing != form_of(endpoint)).then_some(existing)
}

fn form_of(endpoint: &Endpoint) -> Form {
    if endpoint.is_resolved() {
        Form::Resolved
    } else {
        Form::Unresolved
    }
}
