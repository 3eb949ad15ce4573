use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Resolution Errors
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved for {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Resolution of {domain} timed out after {timeout:?}")]
    NameResolutionTimedOut { domain: String, timeout: Duration },
    #[error("Resolver task failed")]
    NameResolutionFailed,

    // Contact Point Errors
    #[error("Invalid contact point: {contact_point}")]
    InvalidContactPoint { contact_point: String },
    #[error("No available contact points")]
    NoAvailableContactPoints,
    #[error("All contact points failed after {attempts} attempt(s)")]
    AllContactPointsFailed { attempts: usize },

    // Connection Errors
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
}

impl NetError {
    /// Build a `NameNotResolvedFor` from an IO error.
    pub fn dns_failed(domain: &str, err: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(err),
        }
    }

    /// Build a `ConnectionFailedTo` from an IO error.
    pub fn connection_failed_to(host: &str, port: u16, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            _ => NetError::ConnectionFailedTo {
                host: host.to_string(),
                port,
                source: Arc::new(err),
            },
        }
    }

    /// Returns true for errors raised while turning a hostname into addresses.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved
                | NetError::NameNotResolvedFor { .. }
                | NetError::NameResolutionTimedOut { .. }
                | NetError::NameResolutionFailed
        )
    }

    /// Returns true for errors that end session bootstrap.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NetError::NoAvailableContactPoints | NetError::AllContactPointsFailed { .. }
        )
    }
}
