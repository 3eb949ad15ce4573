//! Context helpers that turn IO failures into [`NetError`]s.
//!
//! Lookups are tagged with the domain and connects with the dialed address,
//! so a dropped contact point can be traced in the logs.

use crate::base::neterror::NetError;
use std::io;
use std::net::SocketAddr;
use tokio::time::error::Elapsed;

/// Extension trait for IO results.
pub trait IoResultExt<T> {
    /// Tag a failed connect with the address that was dialed.
    ///
    /// # Example
    /// ```ignore
    /// use clusternet::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await.connect_context(addr)?;
    /// // Error: "Connection to 127.0.1.1:9042 failed: connection refused"
    /// ```
    fn connect_context(self, addr: SocketAddr) -> Result<T, NetError>;

    /// Tag a failed lookup with the domain being resolved.
    fn lookup_context(self, domain: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn connect_context(self, addr: SocketAddr) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(&addr.ip().to_string(), addr.port(), e))
    }

    fn lookup_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }
}

/// Extension trait for IO futures raced against `tokio::time::timeout`.
pub trait DeadlineResultExt<T> {
    /// An expired deadline becomes `ConnectionTimedOut`; an IO error keeps its address.
    fn connect_deadline(self, addr: SocketAddr) -> Result<T, NetError>;
}

impl<T> DeadlineResultExt<T> for Result<io::Result<T>, Elapsed> {
    fn connect_deadline(self, addr: SocketAddr) -> Result<T, NetError> {
        match self {
            Ok(result) => result.connect_context(addr),
            Err(_) => Err(NetError::ConnectionTimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};
    use std::time::Duration;

    fn node_addr() -> SocketAddr {
        "127.0.1.1:9042".parse().unwrap()
    }

    #[test]
    fn test_connect_context_keeps_address() {
        let result: io::Result<()> = Err(Error::new(ErrorKind::ConnectionRefused, "refused"));
        match result.connect_context(node_addr()).unwrap_err() {
            NetError::ConnectionFailedTo { host, port, .. } => {
                assert_eq!(host, "127.0.1.1");
                assert_eq!(port, 9042);
            }
            other => panic!("Expected ConnectionFailedTo, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_context_keeps_domain() {
        let result: io::Result<()> = Err(Error::new(ErrorKind::NotFound, "no such host"));
        let err = result.lookup_context("unknown.host").unwrap_err();
        assert!(matches!(
            err,
            NetError::NameNotResolvedFor { ref domain, .. } if domain == "unknown.host"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_timeout() {
        let result = tokio::time::timeout(
            Duration::from_millis(10),
            std::future::pending::<io::Result<()>>(),
        )
        .await;
        assert!(matches!(
            result.connect_deadline(node_addr()),
            Err(NetError::ConnectionTimedOut)
        ));
    }
}
