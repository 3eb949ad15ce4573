//! In-memory resolver for tests and local clusters.
//!
//! Answers come from a mutable `hostname -> ResolverResponse` table. The table
//! is shared between a [`MockResolverFactory`](super::MockResolverFactory) and
//! every resolver it creates, so a test can change answers between phases of
//! a scenario while a session is running.

use super::{Name, Resolve, ResolverResponse, Resolving};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Shared answer table.
pub(crate) type ResponseTable = Arc<DashMap<Name, ResolverResponse>>;

/// Resolver that answers from an in-memory table.
///
/// Hostnames without an entry resolve to [`ResolverResponse::NotFound`].
/// Every call reads the table afresh; nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    responses: ResponseTable,
}

impl MockResolver {
    /// Creates a resolver with an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_table(responses: ResponseTable) -> Self {
        Self { responses }
    }

    /// Replaces the answer for `hostname`. Takes effect on the next `resolve`.
    pub fn update_response(&self, hostname: impl Into<Name>, response: ResolverResponse) {
        let hostname = hostname.into();
        tracing::debug!(domain = %hostname, ?response, "mock resolver answer updated");
        self.responses.insert(hostname, response);
    }

    /// Shorthand for a `Valid` answer; an empty list stores `NotFound`.
    pub fn update_addrs(&self, hostname: impl Into<Name>, addrs: impl IntoIterator<Item = IpAddr>) {
        self.update_response(hostname, ResolverResponse::from_addrs(addrs));
    }

    /// Drops the answer for `hostname`, so it resolves to `NotFound` again.
    pub fn remove_response(&self, hostname: &str) -> Option<ResolverResponse> {
        self.responses
            .remove(&Name::new(hostname))
            .map(|(_, response)| response)
    }

    /// Number of hostnames with an answer.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl Resolve for MockResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let response = self
            .responses
            .get(&name)
            .map(|entry| entry.value().clone())
            .unwrap_or(ResolverResponse::NotFound);
        tracing::trace!(domain = %name, ?response, "mock resolver answered");
        Box::pin(std::future::ready(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::NetError;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 1, last))
    }

    #[tokio::test]
    async fn test_unknown_host_is_not_found() {
        let resolver = MockResolver::new();
        assert_eq!(
            resolver.resolve(Name::new("unknown.host")).await,
            ResolverResponse::NotFound
        );
    }

    #[tokio::test]
    async fn test_update_takes_effect_on_next_call() {
        let resolver = MockResolver::new();
        resolver.update_addrs("test.cluster.fake", [ip(1)]);
        let first = resolver.resolve(Name::new("test.cluster.fake")).await;
        assert_eq!(first.addrs(), &[ip(1)]);

        resolver.update_addrs("test.cluster.fake", [ip(2), ip(3)]);
        let second = resolver.resolve(Name::new("test.cluster.fake")).await;
        assert_eq!(second.addrs(), &[ip(2), ip(3)]);
    }

    #[tokio::test]
    async fn test_repeated_resolve_is_idempotent() {
        let resolver = MockResolver::new();
        resolver.update_addrs("test.cluster.fake", [ip(1), ip(2)]);

        let a = resolver.resolve(Name::new("test.cluster.fake")).await;
        let b = resolver.resolve(Name::new("test.cluster.fake")).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_error_response_round_trips() {
        let resolver = MockResolver::new();
        resolver.update_response("broken.host", ResolverResponse::Error(NetError::NameNotResolved));
        let response = resolver.resolve(Name::new("broken.host")).await;
        assert!(matches!(
            response,
            ResolverResponse::Error(NetError::NameNotResolved)
        ));
    }

    #[tokio::test]
    async fn test_clones_share_table() {
        let resolver = MockResolver::new();
        let clone = resolver.clone();
        resolver.update_addrs("shared.host", [ip(7)]);
        assert_eq!(clone.resolve(Name::new("shared.host")).await.addrs(), &[ip(7)]);

        assert!(clone.remove_response("shared.host").is_some());
        assert!(resolver.is_empty());
    }
}
