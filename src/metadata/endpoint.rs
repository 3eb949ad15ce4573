//! Network targets for cluster nodes.

use crate::dns::Name;
use std::fmt;
use std::net::SocketAddr;

/// A network target, either a concrete address or a hostname kept as-is.
///
/// Registry identity comes from [`Endpoint::id`]. For resolved endpoints
/// the optional `origin` records which contact-point hostname produced the
/// address; it is diagnostic only and not part of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Resolved {
        address: SocketAddr,
        origin: Option<Name>,
    },
    Unresolved {
        hostname: Name,
        port: u16,
    },
}

/// Identity of an [`Endpoint`] inside the node registry.
///
/// Variants never compare equal to each other: `127.0.1.1:9042` and
/// `test.cluster.fake:9042` are different identities even when one
/// resolves to the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointId {
    Resolved(SocketAddr),
    Unresolved { hostname: Name, port: u16 },
}

impl Endpoint {
    pub fn resolved(address: SocketAddr) -> Self {
        Endpoint::Resolved {
            address,
            origin: None,
        }
    }

    /// A resolved endpoint produced by resolving `origin`.
    pub fn resolved_from(address: SocketAddr, origin: impl Into<Name>) -> Self {
        Endpoint::Resolved {
            address,
            origin: Some(origin.into()),
        }
    }

    pub fn unresolved(hostname: impl Into<Name>, port: u16) -> Self {
        Endpoint::Unresolved {
            hostname: hostname.into(),
            port,
        }
    }

    pub fn id(&self) -> EndpointId {
        match self {
            Endpoint::Resolved { address, .. } => EndpointId::Resolved(*address),
            Endpoint::Unresolved { hostname, port } => EndpointId::Unresolved {
                hostname: hostname.clone(),
                port: *port,
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Endpoint::Resolved { .. })
    }

    pub fn port(&self) -> u16 {
        match self {
            Endpoint::Resolved { address, .. } => address.port(),
            Endpoint::Unresolved { port, .. } => *port,
        }
    }

    /// The concrete address, if this endpoint has one.
    pub fn address(&self) -> Option<SocketAddr> {
        match self {
            Endpoint::Resolved { address, .. } => Some(*address),
            Endpoint::Unresolved { .. } => None,
        }
    }

    /// Hostname and port this endpoint traces back to, if any.
    ///
    /// Unresolved endpoints trace to their own hostname, resolved ones to
    /// their origin.
    pub fn hostname_trace(&self) -> Option<(&Name, u16)> {
        match self {
            Endpoint::Resolved { address, origin } => {
                origin.as_ref().map(|name| (name, address.port()))
            }
            Endpoint::Unresolved { hostname, port } => Some((hostname, *port)),
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(address: SocketAddr) -> Self {
        Endpoint::resolved(address)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Resolved { address, .. } => write!(f, "{address}"),
            Endpoint::Unresolved { hostname, port } => write!(f, "{hostname}:{port}"),
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointId::Resolved(address) => write!(f, "{address}"),
            EndpointId::Unresolved { hostname, port } => write!(f, "{hostname}:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_origin() {
        let addr: SocketAddr = "127.0.1.1:9042".parse().unwrap();
        let plain = Endpoint::resolved(addr);
        let traced = Endpoint::resolved_from(addr, "test.cluster.fake");
        assert_eq!(plain.id(), traced.id());
        assert_ne!(plain, traced);
    }

    #[test]
    fn test_variants_are_distinct_identities() {
        let resolved = Endpoint::resolved("127.0.1.1:9042".parse().unwrap());
        let unresolved = Endpoint::unresolved("test.cluster.fake", 9042);
        assert_ne!(resolved.id(), unresolved.id());
    }

    #[test]
    fn test_display_only_shows_hostname_when_unresolved() {
        let traced = Endpoint::resolved_from("127.0.1.1:9042".parse().unwrap(), "test.cluster.fake");
        assert_eq!(traced.to_string(), "127.0.1.1:9042");

        let unresolved = Endpoint::unresolved("test.cluster.fake", 9042);
        assert_eq!(unresolved.to_string(), "test.cluster.fake:9042");
        assert_eq!(unresolved.id().to_string(), "test.cluster.fake:9042");
    }

    #[test]
    fn test_hostname_trace() {
        let traced = Endpoint::resolved_from("127.0.1.1:9042".parse().unwrap(), "test.cluster.fake");
        let (name, port) = traced.hostname_trace().unwrap();
        assert_eq!(name.as_str(), "test.cluster.fake");
        assert_eq!(port, 9042);

        assert!(Endpoint::resolved("127.0.1.1:9042".parse().unwrap())
            .hostname_trace()
            .is_none());
    }
}
