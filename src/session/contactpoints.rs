//! Contact point resolution.
//!
//! Turns the configured `host:port` strings into the ordered endpoint list
//! used for the first control connection. Individual failures drop only
//! the contact point concerned; the pipeline fails only when nothing is left.

use crate::base::neterror::NetError;
use crate::config::ResolutionConfig;
use crate::dns::{parse_ip_literal, resolve_with_timeout, Name, Resolve, ResolverResponse};
use crate::metadata::Endpoint;
use futures::future::join_all;
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// A parsed contact point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactPoint {
    Address(SocketAddr),
    Hostname { hostname: Name, port: u16 },
}

impl ContactPoint {
    /// Parses `host:port`, `ipv4:port` or `[ipv6]:port`.
    pub fn parse(raw: &str) -> Result<Self, NetError> {
        let invalid = || NetError::InvalidContactPoint {
            contact_point: raw.to_string(),
        };
        let trimmed = raw.trim();

        let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = tail.strip_prefix(':').ok_or_else(invalid)?;
            (host, port)
        } else {
            let (host, port) = trimmed.rsplit_once(':').ok_or_else(invalid)?;
            // IPv6 literals must be bracketed
            if host.contains(':') {
                return Err(invalid());
            }
            (host, port)
        };

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(invalid());
        }
        let port: u16 = port.parse().map_err(|_| invalid())?;

        Ok(match parse_ip_literal(host) {
            Some(ip) => ContactPoint::Address(SocketAddr::new(ip, port)),
            None if host.contains(':') || trimmed.starts_with('[') => return Err(invalid()),
            None => ContactPoint::Hostname {
                hostname: Name::new(host),
                port,
            },
        })
    }

    pub fn port(&self) -> u16 {
        match self {
            ContactPoint::Address(addr) => addr.port(),
            ContactPoint::Hostname { port, .. } => *port,
        }
    }
}

impl FromStr for ContactPoint {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContactPoint::parse(s)
    }
}

impl fmt::Display for ContactPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactPoint::Address(addr) => write!(f, "{addr}"),
            ContactPoint::Hostname { hostname, port } => write!(f, "{hostname}:{port}"),
        }
    }
}

/// Resolves contact points into endpoints.
pub struct ContactPointResolver<'a> {
    resolver: &'a dyn Resolve,
    resolve_eagerly: bool,
    resolve_timeout: Duration,
}

impl<'a> ContactPointResolver<'a> {
    pub fn new(resolver: &'a dyn Resolve, config: &ResolutionConfig) -> Self {
        Self {
            resolver,
            resolve_eagerly: config.resolve_contact_points,
            resolve_timeout: config.resolve_timeout_duration(),
        }
    }

    /// Resolve every configured contact point.
    ///
    /// Lookups run concurrently and each one is bounded by the resolve
    /// timeout. Output order follows the configured order, with the
    /// addresses of one hostname kept in resolver order.
    pub async fn resolve_all(&self, raw: &[String]) -> Result<Vec<Endpoint>, NetError> {
        let parsed: Vec<ContactPoint> = raw
            .iter()
            .filter_map(|point| match ContactPoint::parse(point) {
                Ok(cp) => Some(cp),
                Err(e) => {
                    warn!(contact_point = %point, error = %e, "ignoring invalid contact point");
                    None
                }
            })
            .collect();

        let expanded = join_all(parsed.into_iter().map(|cp| self.expand(cp))).await;

        let mut seen = HashSet::new();
        let mut endpoints = Vec::new();
        for endpoint in expanded.into_iter().flatten() {
            if seen.insert(endpoint.id()) {
                endpoints.push(endpoint);
            } else {
                debug!(endpoint = %endpoint, "duplicate contact point endpoint ignored");
            }
        }

        if endpoints.is_empty() {
            warn!(configured = raw.len(), "no contact point could be used");
            return Err(NetError::NoAvailableContactPoints);
        }
        Ok(endpoints)
    }

    async fn expand(&self, contact_point: ContactPoint) -> Vec<Endpoint> {
        match contact_point {
            ContactPoint::Address(addr) => vec![Endpoint::resolved(addr)],
            ContactPoint::Hostname { hostname, port } if !self.resolve_eagerly => {
                debug!(domain = %hostname, port, "keeping contact point unresolved");
                vec![Endpoint::unresolved(hostname, port)]
            }
            ContactPoint::Hostname { hostname, port } => {
                let response =
                    resolve_with_timeout(self.resolver, hostname.clone(), self.resolve_timeout)
                        .await;
                match response {
                    ResolverResponse::Valid(valid) => valid
                        .addrs()
                        .iter()
                        .map(|ip: &IpAddr| {
                            Endpoint::resolved_from(SocketAddr::new(*ip, port), hostname.clone())
                        })
                        .collect(),
                    ResolverResponse::NotFound => {
                        warn!(domain = %hostname, "contact point not found, dropping it");
                        Vec::new()
                    }
                    ResolverResponse::Error(e) => {
                        warn!(domain = %hostname, error = %e, "contact point resolution failed, dropping it");
                        Vec::new()
                    }
                }
            }
        }
    }
}

/// Convenience wrapper over [`ContactPointResolver`].
pub async fn resolve_contact_points(
    config: &ResolutionConfig,
    resolver: &dyn Resolve,
) -> Result<Vec<Endpoint>, NetError> {
    ContactPointResolver::new(resolver, config)
        .resolve_all(&config.contact_points)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{MockResolver, Resolving};
    use crate::metadata::EndpointId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse_hostname() {
        assert_eq!(
            ContactPoint::parse("test.cluster.fake:9042").unwrap(),
            ContactPoint::Hostname {
                hostname: Name::new("test.cluster.fake"),
                port: 9042
            }
        );
    }

    #[test]
    fn test_parse_addresses() {
        assert_eq!(
            ContactPoint::parse("127.0.1.1:9042").unwrap(),
            ContactPoint::Address("127.0.1.1:9042".parse().unwrap())
        );
        assert_eq!(
            ContactPoint::parse("[::1]:9042").unwrap(),
            ContactPoint::Address("[::1]:9042".parse().unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "no-port", "host:", "host:99999", ":9042", "[::1]9042", "::1:9042"] {
            assert!(ContactPoint::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[derive(Default)]
    struct CountingResolver {
        inner: MockResolver,
        calls: AtomicUsize,
    }

    impl Resolve for CountingResolver {
        fn resolve(&self, name: Name) -> Resolving {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(name)
        }
    }

    #[tokio::test]
    async fn test_disabled_resolution_keeps_hostname() {
        let resolver = CountingResolver::default();
        resolver
            .inner
            .update_addrs("test.cluster.fake", ["127.0.1.1".parse().unwrap()]);
        let config = ResolutionConfig::new()
            .resolve_contact_points(false)
            .contact_points(["test.cluster.fake:9042"]);

        let endpoints = resolve_contact_points(&config, &resolver).await.unwrap();
        assert_eq!(endpoints, vec![Endpoint::unresolved("test.cluster.fake", 9042)]);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enabled_resolution_expands_addresses() {
        let resolver = MockResolver::new();
        resolver.update_addrs(
            "test.cluster.fake",
            ["127.0.1.1".parse().unwrap(), "127.0.1.2".parse().unwrap()],
        );
        let config = ResolutionConfig::new().contact_points(["test.cluster.fake:9042"]);

        let endpoints = resolve_contact_points(&config, &resolver).await.unwrap();
        assert_eq!(
            endpoints,
            vec![
                Endpoint::resolved_from("127.0.1.1:9042".parse().unwrap(), "test.cluster.fake"),
                Endpoint::resolved_from("127.0.1.2:9042".parse().unwrap(), "test.cluster.fake"),
            ]
        );
    }

    #[tokio::test]
    async fn test_literal_ip_never_hits_resolver() {
        let resolver = CountingResolver::default();
        let config = ResolutionConfig::new()
            .resolve_contact_points(false)
            .contact_points(["127.0.0.1:9042"]);

        let endpoints = resolve_contact_points(&config, &resolver).await.unwrap();
        assert!(endpoints[0].is_resolved());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_are_dropped() {
        let resolver = MockResolver::new();
        resolver.update_addrs("good.host", ["127.0.1.1".parse().unwrap()]);
        let config = ResolutionConfig::new().contact_points([
            "unknown.host:9042",
            "not a contact point",
            "good.host:9042",
        ]);

        let endpoints = resolve_contact_points(&config, &resolver).await.unwrap();
        assert_eq!(
            endpoints.iter().map(Endpoint::id).collect::<Vec<_>>(),
            vec![EndpointId::Resolved("127.0.1.1:9042".parse().unwrap())]
        );
    }

    #[tokio::test]
    async fn test_all_dropped_is_fatal() {
        let resolver = MockResolver::new();
        let config =
            ResolutionConfig::new().contact_points(["unknown.host:9042", "other.host:9042"]);

        let err = resolve_contact_points(&config, &resolver).await.unwrap_err();
        assert!(matches!(err, NetError::NoAvailableContactPoints));
    }

    #[tokio::test]
    async fn test_duplicates_are_collapsed() {
        let resolver = MockResolver::new();
        resolver.update_addrs("a.host", ["127.0.1.1".parse().unwrap()]);
        let config = ResolutionConfig::new().contact_points([
            "127.0.1.1:9042",
            "a.host:9042",
            "127.0.1.1:9042",
        ]);

        let endpoints = resolve_contact_points(&config, &resolver).await.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].hostname_trace(), None);
    }

    struct SlowThenFast {
        fast: MockResolver,
    }

    impl Resolve for SlowThenFast {
        fn resolve(&self, name: Name) -> Resolving {
            if name.as_str() == "slow.host" {
                Box::pin(std::future::pending())
            } else {
                self.fast.resolve(name)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out_and_is_dropped() {
        let fast = MockResolver::new();
        fast.update_addrs("fast.host", ["127.0.1.5".parse().unwrap()]);
        let resolver = Arc::new(SlowThenFast { fast });
        let config = ResolutionConfig::new()
            .contact_points(["slow.host:9042", "fast.host:9042"])
            .resolve_timeout(Duration::from_millis(200));

        let endpoints = resolve_contact_points(&config, &resolver).await.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].address(), Some("127.0.1.5:9042".parse().unwrap()));
    }
}
