//! Opening connections to concrete addresses.
//!
//! Framing, pooling and the protocol handshake belong to the embedding
//! client. Bootstrap only needs something that can reach a `SocketAddr`.

use crate::base::{context::DeadlineResultExt, neterror::NetError};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Alias for the `Future` returned by [`Transport::open`].
pub type Opening<C> = Pin<Box<dyn Future<Output = Result<C, NetError>> + Send>>;

/// Opens a connection to one address.
pub trait Transport: Send + Sync {
    type Connection: Send + 'static;

    fn open(&self, addr: SocketAddr) -> Opening<Self::Connection>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Connection = T::Connection;

    fn open(&self, addr: SocketAddr) -> Opening<Self::Connection> {
        (**self).open(addr)
    }
}

/// Plain TCP with a connect timeout.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Transport for TcpTransport {
    type Connection = TcpStream;

    fn open(&self, addr: SocketAddr) -> Opening<TcpStream> {
        let connect_timeout = self.connect_timeout;
        Box::pin(async move {
            tracing::debug!(%addr, "opening TCP connection");
            tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
                .await
                .connect_deadline(addr)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_transport_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let stream = TcpTransport::default().open(addr).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_tcp_transport_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = TcpTransport::default().open(addr).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ConnectionFailedTo { .. } | NetError::ConnectionTimedOut
        ));
    }
}
