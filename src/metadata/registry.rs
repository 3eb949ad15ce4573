//! Published node registry.
//!
//! The registry is an immutable [`Metadata`] value behind an `ArcSwap`.
//! Readers load the current `Arc` without locking; the reconciler builds a
//! complete replacement and swaps it in, so a reader sees either the state
//! before a merge or the state after it.

use super::endpoint::EndpointId;
use super::node::Node;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// Point-in-time view of all known nodes.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    sequence: Option<u64>,
    nodes: HashMap<EndpointId, Arc<Node>>,
}

impl Metadata {
    pub(crate) fn new(sequence: Option<u64>, nodes: HashMap<EndpointId, Arc<Node>>) -> Self {
        Self { sequence, nodes }
    }

    /// Sequence number of the topology snapshot this view was built from.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn nodes(&self) -> &HashMap<EndpointId, Arc<Node>> {
        &self.nodes
    }

    pub fn get(&self, id: &EndpointId) -> Option<&Arc<Node>> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.values()
    }

    pub fn up_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_up()).count()
    }

    /// Nodes whose endpoint traces back to `hostname`, in either form.
    pub fn traced_to(&self, hostname: &str) -> Vec<Arc<Node>> {
        self.nodes
            .values()
            .filter(|n| {
                n.endpoint()
                    .hostname_trace()
                    .is_some_and(|(name, _)| name.as_str() == hostname)
            })
            .cloned()
            .collect()
    }

    /// Nodes still kept under their unresolved hostname.
    pub fn unresolved(&self) -> Vec<Arc<Node>> {
        self.nodes
            .values()
            .filter(|n| !n.endpoint().is_resolved())
            .cloned()
            .collect()
    }
}

/// Shared handle to the published registry. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    current: Arc<ArcSwap<Metadata>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current view. Holding it never blocks the writer.
    pub fn snapshot(&self) -> Arc<Metadata> {
        self.current.load_full()
    }

    pub(crate) fn publish(&self, metadata: Metadata) {
        self.current.store(Arc::new(metadata));
    }
}
