use crate::base::neterror::NetError;
use crate::dns::{resolve_with_timeout, Resolve, SocketAddrs};
use crate::metadata::Endpoint;
use crate::socket::transport::Transport;
use std::net::SocketAddr;
use std::time::Duration;

/// A connection opened to an endpoint, with the address that answered.
#[derive(Debug)]
pub struct Connected<C> {
    pub endpoint: Endpoint,
    pub address: SocketAddr,
    pub connection: C,
}

/// Manages the connection process for one endpoint: resolve (if needed) -> connect.
///
/// Unresolved endpoints are resolved here, at connect time, every time. This
/// is where a session with `resolve-contact-points = false` still reaches its
/// resolver.
pub struct ConnectJob<'a, T: ?Sized> {
    resolver: &'a dyn Resolve,
    transport: &'a T,
    resolve_timeout: Duration,
}

impl<'a, T: Transport + ?Sized> ConnectJob<'a, T> {
    pub fn new(resolver: &'a dyn Resolve, transport: &'a T, resolve_timeout: Duration) -> Self {
        Self {
            resolver,
            transport,
            resolve_timeout,
        }
    }

    pub async fn connect(&self, endpoint: &Endpoint) -> Result<Connected<T::Connection>, NetError> {
        // 1. Addresses to try
        let addrs = match endpoint {
            Endpoint::Resolved { address, .. } => SocketAddrs::new(vec![*address]),
            Endpoint::Unresolved { hostname, port } => {
                let response =
                    resolve_with_timeout(self.resolver, hostname.clone(), self.resolve_timeout)
                        .await;
                let valid = response.into_result(hostname)?;
                tracing::debug!(
                    endpoint = %endpoint,
                    count = valid.len(),
                    "resolved endpoint at connect time"
                );
                SocketAddrs::from_response(&valid, *port)
            }
        };

        // 2. Connect, first address that answers wins
        let mut last_error = NetError::ConnectionFailed;
        for addr in addrs {
            match self.transport.open(addr).await {
                Ok(connection) => {
                    tracing::debug!(endpoint = %endpoint, %addr, "connected");
                    return Ok(Connected {
                        endpoint: endpoint.clone(),
                        address: addr,
                        connection,
                    });
                }
                Err(e) => {
                    tracing::debug!(endpoint = %endpoint, %addr, error = %e, "connection attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{MockResolver, ResolverResponse};
    use crate::socket::transport::Opening;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::net::IpAddr;

    /// Accepts connections only to the listed addresses and records every attempt.
    #[derive(Default)]
    struct RecordingTransport {
        reachable: HashSet<SocketAddr>,
        attempts: Mutex<Vec<SocketAddr>>,
    }

    impl Transport for RecordingTransport {
        type Connection = SocketAddr;

        fn open(&self, addr: SocketAddr) -> Opening<SocketAddr> {
            self.attempts.lock().push(addr);
            let ok = self.reachable.contains(&addr);
            Box::pin(async move {
                if ok {
                    Ok(addr)
                } else {
                    Err(NetError::ConnectionRefused)
                }
            })
        }
    }

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_resolved_endpoint_skips_resolver() {
        let resolver = MockResolver::new();
        let transport = RecordingTransport {
            reachable: [addr("127.0.1.1:9042")].into_iter().collect(),
            ..Default::default()
        };
        let job = ConnectJob::new(&resolver, &transport, Duration::from_secs(1));

        let connected = job
            .connect(&Endpoint::resolved(addr("127.0.1.1:9042")))
            .await
            .unwrap();
        assert_eq!(connected.address, addr("127.0.1.1:9042"));
    }

    #[tokio::test]
    async fn test_unresolved_endpoint_resolves_at_connect_time() {
        let resolver = MockResolver::new();
        resolver.update_addrs(
            "test.cluster.fake",
            ["127.0.1.1".parse::<IpAddr>().unwrap(), "127.0.1.2".parse().unwrap()],
        );
        let transport = RecordingTransport {
            reachable: [addr("127.0.1.2:9042")].into_iter().collect(),
            ..Default::default()
        };
        let job = ConnectJob::new(&resolver, &transport, Duration::from_secs(1));

        let endpoint = Endpoint::unresolved("test.cluster.fake", 9042);
        let connected = job.connect(&endpoint).await.unwrap();

        assert_eq!(connected.endpoint, endpoint);
        assert_eq!(connected.address, addr("127.0.1.2:9042"));
        assert_eq!(
            *transport.attempts.lock(),
            vec![addr("127.0.1.1:9042"), addr("127.0.1.2:9042")]
        );
    }

    #[tokio::test]
    async fn test_unresolvable_endpoint_fails_without_connecting() {
        let resolver = MockResolver::new();
        resolver.update_response("gone.host", ResolverResponse::NotFound);
        let transport = RecordingTransport::default();
        let job = ConnectJob::new(&resolver, &transport, Duration::from_secs(1));

        let err = job
            .connect(&Endpoint::unresolved("gone.host", 9042))
            .await
            .unwrap_err();
        assert!(err.is_resolution_error());
        assert!(transport.attempts.lock().is_empty());
    }
}
