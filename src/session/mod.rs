//! Session bootstrap.
//!
//! A [`Session`] owns the resolver built for it, the control connection and
//! the topology reconciler. Everything a session needs from the outside is
//! passed to its [`SessionBuilder`].
//!
//! # Example
//!
//! ```rust,ignore
//! use clusternet::config::ResolutionConfig;
//! use clusternet::dns::{MockResolverFactory, ResolverProvider};
//! use clusternet::session::Session;
//!
//! let factory = MockResolverFactory::new();
//! factory.update_addrs("test.cluster.fake", ["127.0.1.1".parse()?]);
//!
//! let config = ResolutionConfig::new()
//!     .resolve_contact_points(false)
//!     .contact_points(["test.cluster.fake:9042"]);
//!
//! let session = Session::builder(config)
//!     .resolver_provider(ResolverProvider::new(factory))
//!     .connect()
//!     .await?;
//! ```

pub mod contactpoints;
pub mod retry;

pub use contactpoints::{resolve_contact_points, ContactPoint, ContactPointResolver};
pub use retry::{calculate_backoff, should_retry, RetryConfig, RetryReason};

use crate::base::neterror::NetError;
use crate::config::ResolutionConfig;
use crate::dns::{Resolve, ResolverProvider};
use crate::metadata::{
    Endpoint, MergeOutcome, Metadata, NodeEvent, NodeRegistry, TopologyReconciler,
    TopologySnapshot,
};
use crate::socket::connectjob::{ConnectJob, Connected};
use crate::socket::transport::{TcpTransport, Transport};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for [`Session`].
pub struct SessionBuilder<T = TcpTransport> {
    config: ResolutionConfig,
    provider: ResolverProvider,
    transport: T,
}

impl SessionBuilder<TcpTransport> {
    pub fn new(config: ResolutionConfig) -> Self {
        let transport = TcpTransport::new(config.connect_timeout_duration());
        Self {
            config,
            provider: ResolverProvider::default(),
            transport,
        }
    }
}

impl<T: Transport> SessionBuilder<T> {
    /// Resolver provider to build this session's resolver from.
    pub fn resolver_provider(mut self, provider: ResolverProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Replace the transport used for the control connection.
    pub fn transport<U: Transport>(self, transport: U) -> SessionBuilder<U> {
        SessionBuilder {
            config: self.config,
            provider: self.provider,
            transport,
        }
    }

    /// Resolve contact points and open the control connection.
    ///
    /// The resolver is created exactly once, here. Fails with
    /// `NoAvailableContactPoints` before any connection attempt when every
    /// contact point is dropped, and with `AllContactPointsFailed` when no
    /// endpoint accepts a connection.
    pub async fn connect(self) -> Result<Session<T>, NetError> {
        let resolver = self.provider.create_resolver(&self.config);
        let contact_points = resolve_contact_points(&self.config, resolver.as_ref()).await?;
        debug!(count = contact_points.len(), "contact points ready");

        let control = open_control(
            &self.config,
            resolver.as_ref(),
            &self.transport,
            &contact_points,
        )
        .await?;
        info!(
            endpoint = %control.endpoint,
            address = %control.address,
            "control connection established"
        );

        let reconciler = TopologyReconciler::new();
        reconciler.merge(TopologySnapshot::new(
            SEED_SEQUENCE,
            contact_points.iter().cloned(),
        ));
        reconciler.on_node_event(NodeEvent::Up(control.endpoint.id()));

        Ok(Session {
            config: self.config,
            resolver,
            transport: self.transport,
            contact_points,
            control,
            reconciler,
        })
    }
}

/// Sequence of the registry seeded from contact points. Topology snapshots
/// must be numbered above it.
pub const SEED_SEQUENCE: u64 = 0;

/// A bootstrapped session.
pub struct Session<T: Transport = TcpTransport> {
    config: ResolutionConfig,
    resolver: Arc<dyn Resolve>,
    transport: T,
    contact_points: Vec<Endpoint>,
    control: Connected<T::Connection>,
    reconciler: TopologyReconciler,
}

impl Session<TcpTransport> {
    pub fn builder(config: ResolutionConfig) -> SessionBuilder<TcpTransport> {
        SessionBuilder::new(config)
    }
}

impl<T: Transport> Session<T> {
    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// The resolver created for this session.
    pub fn resolver(&self) -> &Arc<dyn Resolve> {
        &self.resolver
    }

    /// Endpoints produced by contact point resolution, in connection order.
    pub fn contact_points(&self) -> &[Endpoint] {
        &self.contact_points
    }

    /// Endpoint the control connection was opened to.
    pub fn control_endpoint(&self) -> &Endpoint {
        &self.control.endpoint
    }

    /// Address the control connection actually reached.
    pub fn control_address(&self) -> SocketAddr {
        self.control.address
    }

    pub fn control_connection(&self) -> &T::Connection {
        &self.control.connection
    }

    /// Current view of the cluster.
    pub fn metadata(&self) -> Arc<Metadata> {
        self.reconciler.metadata()
    }

    /// Read handle that stays current across merges.
    pub fn registry(&self) -> NodeRegistry {
        self.reconciler.registry()
    }

    /// Merge a topology snapshot reported by the control connection.
    ///
    /// The control node lists itself by the address it answers on; that
    /// entry is merged under the endpoint the connection was opened with.
    pub fn apply_topology(&self, snapshot: TopologySnapshot) -> MergeOutcome {
        self.reconciler.merge(self.with_control_endpoint(snapshot))
    }

    fn with_control_endpoint(&self, mut snapshot: TopologySnapshot) -> TopologySnapshot {
        let control = &self.control;
        for endpoint in snapshot.endpoints.iter_mut() {
            if endpoint.address() == Some(control.address) && *endpoint != control.endpoint {
                debug!(
                    reported = %endpoint,
                    endpoint = %control.endpoint,
                    "control node reported by address"
                );
                *endpoint = control.endpoint.clone();
            }
        }
        snapshot
    }

    /// Apply a liveness event. Returns false for unknown nodes.
    pub fn on_node_event(&self, event: NodeEvent) -> bool {
        self.reconciler.on_node_event(event)
    }

    /// Reopen the control connection through the same contact points.
    ///
    /// Unresolved contact points go through the session's resolver again,
    /// so whatever it answers now is what gets dialed.
    pub async fn reconnect(&mut self) -> Result<(), NetError> {
        let control = open_control(
            &self.config,
            self.resolver.as_ref(),
            &self.transport,
            &self.contact_points,
        )
        .await?;
        info!(
            endpoint = %control.endpoint,
            address = %control.address,
            "control connection re-established"
        );
        self.reconciler.on_node_event(NodeEvent::Up(control.endpoint.id()));
        self.control = control;
        Ok(())
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("contact_points", &self.contact_points)
            .field("control", &self.control.address)
            .field("nodes", &self.metadata().len())
            .finish()
    }
}

/// Walk `endpoints` in order until one accepts a connection.
///
/// With `reconnect_on_init` the walk is repeated on the configured backoff
/// schedule; otherwise one failed pass is final.
async fn open_control<T: Transport + ?Sized>(
    config: &ResolutionConfig,
    resolver: &dyn Resolve,
    transport: &T,
    endpoints: &[Endpoint],
) -> Result<Connected<T::Connection>, NetError> {
    let job = ConnectJob::new(resolver, transport, config.resolve_timeout_duration());
    let retry = if config.reconnect_on_init {
        config.reconnection.clone()
    } else {
        RetryConfig::no_retry()
    };

    let mut retries = 0;
    loop {
        let mut retryable = false;
        for endpoint in endpoints {
            match job.connect(endpoint).await {
                Ok(connected) => return Ok(connected),
                Err(e) => {
                    let reason = RetryReason::from_error(&e);
                    retryable |= reason.is_some();
                    warn!(endpoint = %endpoint, error = %e, ?reason, "contact point unreachable");
                }
            }
        }

        if !retryable || !should_retry(retries, &retry) {
            return Err(NetError::AllContactPointsFailed {
                attempts: retries + 1,
            });
        }
        retries += 1;
        let delay = calculate_backoff(retries, &retry);
        info!(
            retry = retries,
            delay_ms = delay.as_millis() as u64,
            "no contact point reachable, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
