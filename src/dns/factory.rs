//! Resolver factories.
//!
//! A session asks its [`ResolverProvider`](super::ResolverProvider) for a
//! factory once, at construction, and keeps the resolver it builds for its
//! whole lifetime.

use super::mock::ResponseTable;
use super::{
    DnsResolverWithOverrides, GaiResolver, HickoryResolver, MockResolver, Name, Resolve,
    ResolverResponse,
};
use crate::config::ResolutionConfig;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// Builds resolver instances.
///
/// Every call to [`create`](ResolverFactory::create) returns an independent
/// resolver. Factories may share state between the resolvers they build
/// (the mock factory shares its answer table) but must not hand out the
/// same instance twice unless that is their documented purpose.
pub trait ResolverFactory: Send + Sync + fmt::Debug {
    fn create(&self, config: &ResolutionConfig) -> Arc<dyn Resolve>;
}

impl<F: ResolverFactory + ?Sized> ResolverFactory for Arc<F> {
    fn create(&self, config: &ResolutionConfig) -> Arc<dyn Resolve> {
        (**self).create(config)
    }
}

/// Builds [`GaiResolver`]s. This is the default factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaiResolverFactory;

impl ResolverFactory for GaiResolverFactory {
    fn create(&self, _config: &ResolutionConfig) -> Arc<dyn Resolve> {
        Arc::new(GaiResolver::new())
    }
}

/// Builds [`HickoryResolver`]s, each with its own cache. Queries give up
/// after the configured resolve timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct HickoryResolverFactory;

impl ResolverFactory for HickoryResolverFactory {
    fn create(&self, config: &ResolutionConfig) -> Arc<dyn Resolve> {
        Arc::new(HickoryResolver::with_query_timeout(
            config.resolve_timeout_duration(),
        ))
    }
}

/// Wraps another factory's resolvers with a static hostname table.
pub struct OverridesResolverFactory {
    inner: Arc<dyn ResolverFactory>,
    overrides: HashMap<Cow<'static, str>, Vec<IpAddr>>,
}

impl OverridesResolverFactory {
    pub fn new(
        inner: Arc<dyn ResolverFactory>,
        overrides: HashMap<Cow<'static, str>, Vec<IpAddr>>,
    ) -> Self {
        Self { inner, overrides }
    }
}

impl ResolverFactory for OverridesResolverFactory {
    fn create(&self, config: &ResolutionConfig) -> Arc<dyn Resolve> {
        Arc::new(DnsResolverWithOverrides::new(
            self.inner.create(config),
            self.overrides.clone(),
        ))
    }
}

impl fmt::Debug for OverridesResolverFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverridesResolverFactory")
            .field("inner", &self.inner)
            .field("pinned", &self.overrides.len())
            .finish()
    }
}

/// Builds [`MockResolver`]s that all read one shared answer table.
///
/// # Example
///
/// ```rust,ignore
/// use clusternet::dns::{MockResolverFactory, ResolverProvider};
///
/// let factory = MockResolverFactory::new();
/// factory.update_addrs("test.cluster.fake", ["127.0.1.1".parse().unwrap()]);
/// let provider = ResolverProvider::new(factory.clone());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockResolverFactory {
    responses: ResponseTable,
}

impl MockResolverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the answer for `hostname` in every resolver built by this factory,
    /// including ones created before the call.
    pub fn update_response(&self, hostname: impl Into<Name>, response: ResolverResponse) {
        self.resolver_view().update_response(hostname, response);
    }

    /// Shorthand for a `Valid` answer.
    pub fn update_addrs(&self, hostname: impl Into<Name>, addrs: impl IntoIterator<Item = IpAddr>) {
        self.resolver_view().update_addrs(hostname, addrs);
    }

    fn resolver_view(&self) -> MockResolver {
        MockResolver::with_table(Arc::clone(&self.responses))
    }
}

impl ResolverFactory for MockResolverFactory {
    fn create(&self, _config: &ResolutionConfig) -> Arc<dyn Resolve> {
        Arc::new(self.resolver_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_mock_factory_updates_existing_resolvers() {
        let factory = MockResolverFactory::new();
        let config = ResolutionConfig::default();
        let resolver = factory.create(&config);

        factory.update_addrs("test.cluster.fake", [IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1))]);
        let response = resolver.resolve(Name::new("test.cluster.fake")).await;
        assert_eq!(response.addrs(), &[IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1))]);
    }

    #[test]
    fn test_create_yields_independent_instances() {
        let factory = MockResolverFactory::new();
        let config = ResolutionConfig::default();
        let a = factory.create(&config);
        let b = factory.create(&config);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_overrides_factory_consults_table_first() {
        let mock = MockResolverFactory::new();
        mock.update_addrs("node1.local", [IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))]);

        let mut overrides = HashMap::new();
        overrides.insert(
            Cow::Borrowed("node1.local"),
            vec![IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1))],
        );
        let factory = OverridesResolverFactory::new(Arc::new(mock), overrides);
        let resolver = factory.create(&ResolutionConfig::default());

        let response = resolver.resolve(Name::new("node1.local")).await;
        assert_eq!(response.addrs(), &[IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1))]);
        assert_eq!(
            resolver.resolve(Name::new("other.local")).await,
            ResolverResponse::NotFound
        );
    }
}
