//! System resolver.
//!
//! Runs `getaddrinfo` on tokio's blocking pool, so `/etc/hosts` and the
//! platform resolver configuration apply. This is what sessions use unless a
//! different factory is installed.

use super::{Name, Resolve, ResolverResponse, Resolving, ValidResponse};
use crate::base::{context::IoResultExt, neterror::NetError};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

/// Resolver backed by the operating system.
///
/// Answers keep the order `getaddrinfo` returned, minus repeats (one entry
/// per socket type is common).
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    pub fn new() -> Self {
        Self
    }
}

fn lookup_blocking(domain: &str) -> Result<Vec<IpAddr>, NetError> {
    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in (domain, 0u16).to_socket_addrs().lookup_context(domain)? {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }
    Ok(ips)
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            tracing::debug!(domain = %name, "resolving via getaddrinfo");
            let domain = name.as_str().to_owned();

            let response = match tokio::task::spawn_blocking(move || lookup_blocking(&domain)).await
            {
                Ok(Ok(ips)) => ResolverResponse::from_addrs(ips),
                Ok(Err(e)) => ResolverResponse::Error(e),
                // cancelled or panicked
                Err(join) => {
                    tracing::error!(domain = %name, error = %join, "getaddrinfo task failed");
                    ResolverResponse::Error(NetError::NameResolutionFailed)
                }
            };

            match &response {
                ResolverResponse::Valid(valid) => {
                    tracing::debug!(domain = %name, count = valid.len(), "getaddrinfo answered")
                }
                ResolverResponse::NotFound => {
                    tracing::debug!(domain = %name, "getaddrinfo returned no addresses")
                }
                ResolverResponse::Error(e) => {
                    tracing::debug!(domain = %name, error = %e, "getaddrinfo failed")
                }
            }
            response
        })
    }
}

/// Socket addresses to dial for one endpoint, in order.
#[derive(Debug, Clone)]
pub struct SocketAddrs {
    iter: std::vec::IntoIter<SocketAddr>,
}

impl SocketAddrs {
    pub fn new(addrs: Vec<SocketAddr>) -> Self {
        Self {
            iter: addrs.into_iter(),
        }
    }

    /// Pairs every address of a resolver answer with `port`.
    pub fn from_response(valid: &ValidResponse, port: u16) -> Self {
        Self::new(
            valid
                .addrs()
                .iter()
                .map(|ip| SocketAddr::new(*ip, port))
                .collect(),
        )
    }

    /// Addresses not yet handed out.
    pub fn len(&self) -> usize {
        self.iter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Iterator for SocketAddrs {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<SocketAddr> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Parses an IPv4 or IPv6 literal. IPv6 may be wrapped in brackets.
pub fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    if let Ok(v4) = host.parse::<Ipv4Addr>() {
        return Some(IpAddr::V4(v4));
    }
    let inner = match host.strip_prefix('[') {
        Some(rest) => rest.strip_suffix(']')?,
        None => host,
    };
    inner.parse::<Ipv6Addr>().ok().map(IpAddr::V6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_literal() {
        assert_eq!(
            parse_ip_literal("127.0.1.1"),
            Some(IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1)))
        );
        assert_eq!(parse_ip_literal("::1"), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(parse_ip_literal("[::1]"), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(parse_ip_literal("[::1"), None);
        assert_eq!(parse_ip_literal("test.cluster.fake"), None);
    }

    #[test]
    fn test_from_response_keeps_order() {
        let valid = ValidResponse::new(vec![
            IpAddr::V4(Ipv4Addr::new(127, 0, 1, 3)),
            IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1)),
        ])
        .unwrap();
        let mut addrs = SocketAddrs::from_response(&valid, 9042);
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs.next(), Some("127.0.1.3:9042".parse().unwrap()));
        assert_eq!(addrs.next(), Some("127.0.1.1:9042".parse().unwrap()));
        assert!(addrs.is_empty());
    }

    #[test]
    fn test_lookup_ip_literal_needs_no_dns() {
        let ips = lookup_blocking("127.0.1.9").unwrap();
        assert_eq!(ips, vec![IpAddr::V4(Ipv4Addr::new(127, 0, 1, 9))]);
    }

    #[tokio::test]
    async fn test_gai_resolver_localhost() {
        let resolver = GaiResolver::new();
        let response = resolver.resolve(Name::new("localhost")).await;

        // localhost should always resolve
        assert!(response.is_valid());
        assert!(!response.addrs().is_empty());
    }
}
