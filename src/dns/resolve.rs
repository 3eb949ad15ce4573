//! Resolver contract: names, answers and the `Resolve` trait.
//!
//! Every backend (system, hickory, in-memory table) speaks in these types, so
//! the contact point pipeline and connect jobs never see which one is active.

use crate::base::neterror::NetError;
use std::{
    borrow::Cow, collections::HashMap, fmt, future::Future, net::IpAddr, pin::Pin, sync::Arc,
    time::Duration,
};

/// Hostname handed to a resolver, without port.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(host: &str) -> Self {
        Self::new(host)
    }
}

impl From<String> for Name {
    fn from(host: String) -> Self {
        Self::new(host)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-empty, ordered list of addresses returned for a hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidResponse {
    addrs: Vec<IpAddr>,
}

impl ValidResponse {
    /// Returns `None` when `addrs` is empty.
    pub fn new(addrs: Vec<IpAddr>) -> Option<Self> {
        if addrs.is_empty() {
            None
        } else {
            Some(Self { addrs })
        }
    }

    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Never true: a valid response holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Outcome of a single resolver call.
///
/// Every call yields exactly one of these. A `Valid` answer always carries
/// at least one address; use [`ResolverResponse::from_addrs`] to build one
/// from a list that may be empty.
#[derive(Debug, Clone)]
pub enum ResolverResponse {
    Valid(ValidResponse),
    NotFound,
    Error(NetError),
}

impl ResolverResponse {
    /// Wrap a list of addresses, mapping an empty list to `NotFound`.
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        match ValidResponse::new(addrs.into_iter().collect()) {
            Some(valid) => ResolverResponse::Valid(valid),
            None => ResolverResponse::NotFound,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ResolverResponse::Valid(_))
    }

    /// Addresses of a `Valid` answer, empty otherwise.
    pub fn addrs(&self) -> &[IpAddr] {
        match self {
            ResolverResponse::Valid(valid) => valid.addrs(),
            ResolverResponse::NotFound | ResolverResponse::Error(_) => &[],
        }
    }

    /// Converts the answer into a `Result`, turning `NotFound` into an error for `name`.
    pub fn into_result(self, name: &Name) -> Result<ValidResponse, NetError> {
        match self {
            ResolverResponse::Valid(valid) => Ok(valid),
            ResolverResponse::NotFound => Err(NetError::dns_failed(
                name.as_str(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses for host"),
            )),
            ResolverResponse::Error(e) => Err(e),
        }
    }
}

impl PartialEq for ResolverResponse {
    /// Errors compare equal by message; their sources are not comparable.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolverResponse::Valid(a), ResolverResponse::Valid(b)) => a == b,
            (ResolverResponse::NotFound, ResolverResponse::NotFound) => true,
            (ResolverResponse::Error(a), ResolverResponse::Error(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

impl From<ValidResponse> for ResolverResponse {
    fn from(value: ValidResponse) -> Self {
        ResolverResponse::Valid(value)
    }
}

/// Alias for the `Future` type returned by a resolver.
pub type Resolving = Pin<Box<dyn Future<Output = ResolverResponse> + Send>>;

/// Pluggable hostname lookup.
///
/// Implementations are shared across tasks behind `Arc<dyn Resolve>` and may
/// answer differently for the same name from one call to the next. Failures
/// come back in-band as [`ResolverResponse::Error`], never as a panic.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        R::resolve(self, name)
    }
}

/// Runs one lookup, turning an expired `timeout` into `ResolverResponse::Error`.
///
/// The lookup future is dropped on expiry; a blocking resolver may keep its
/// worker thread busy until the system call returns.
pub async fn resolve_with_timeout(
    resolver: &dyn Resolve,
    name: Name,
    timeout: Duration,
) -> ResolverResponse {
    let domain = name.as_str().to_string();
    match tokio::time::timeout(timeout, resolver.resolve(name)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(domain = %domain, ?timeout, "resolution timed out");
            ResolverResponse::Error(NetError::NameResolutionTimedOut { domain, timeout })
        }
    }
}

/// Answers from a fixed hostname table first and asks `inner` for everything else.
///
/// A hostname mapped to an empty list answers `NotFound` without reaching
/// `inner`, which is how a pinned setup marks a node as gone.
///
/// ```rust,ignore
/// let table = HashMap::from([("node1.local".into(), vec!["127.0.1.1".parse()?])]);
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()), table);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    table: Arc<HashMap<Cow<'static, str>, Vec<IpAddr>>>,
}

impl DnsResolverWithOverrides {
    pub fn new(inner: Arc<dyn Resolve>, table: HashMap<Cow<'static, str>, Vec<IpAddr>>) -> Self {
        Self {
            inner,
            table: Arc::new(table),
        }
    }

    /// Number of pinned hostnames.
    pub fn pinned(&self) -> usize {
        self.table.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        match self.table.get(name.as_str()) {
            Some(addrs) => {
                tracing::trace!(domain = %name, "answered from pinned table");
                Box::pin(std::future::ready(ResolverResponse::from_addrs(
                    addrs.iter().copied(),
                )))
            }
            None => self.inner.resolve(name),
        }
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("pinned", &self.pinned())
            .finish_non_exhaustive()
    }
}
