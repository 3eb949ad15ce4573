//! Async resolver backed by hickory-dns.
//!
//! Each [`HickoryResolver`] owns its own hickory instance (and therefore its
//! own record cache), configured from the system settings when they can be
//! read. Clones share the instance.

use super::{Name, Resolve, ResolverResponse, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    ResolveError, TokioResolver,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Resolver that queries name servers directly instead of going through
/// `getaddrinfo`.
///
/// Cached answers honor record TTLs, so a hostname can map to a different
/// set once its records expire.
///
/// # Example
///
/// ```rust,ignore
/// use clusternet::dns::{HickoryResolver, Name, Resolve};
///
/// let resolver = HickoryResolver::new();
/// let response = resolver.resolve(Name::new("cassandra.internal")).await;
/// ```
#[derive(Clone)]
pub struct HickoryResolver {
    inner: Arc<TokioResolver>,
}

impl HickoryResolver {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Per-query timeout applied inside hickory, below the session's own bound.
    pub fn with_query_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(query_timeout: Option<Duration>) -> Self {
        let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "system DNS configuration unreadable, using defaults");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
        });

        let options = builder.options_mut();
        options.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        if let Some(timeout) = query_timeout {
            options.timeout = timeout;
        }

        Self {
            inner: Arc::new(builder.build()),
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryResolver").finish_non_exhaustive()
    }
}

fn to_response(domain: &str, error: ResolveError) -> ResolverResponse {
    if error.is_no_records_found() {
        return ResolverResponse::NotFound;
    }
    ResolverResponse::Error(NetError::NameNotResolvedFor {
        domain: domain.to_owned(),
        source: Arc::new(std::io::Error::other(error.to_string())),
    })
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let response = match inner.lookup_ip(name.as_str()).await {
                Ok(lookup) => ResolverResponse::from_addrs(lookup.iter()),
                Err(e) => to_response(name.as_str(), e),
            };
            tracing::debug!(
                domain = %name,
                found = response.addrs().len(),
                valid = response.is_valid(),
                "hickory-dns lookup finished"
            );
            response
        })
    }
}
