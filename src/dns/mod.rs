//! DNS Resolution Module
//!
//! Provides pluggable hostname resolution with support for:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver
//! - Static hostname tables and an in-memory mock for tests
//!
//! # Architecture
//!
//! The `Resolve` trait is the core abstraction that lets resolver
//! implementations be used interchangeably. A [`ResolverFactory`] builds one
//! resolver per session and a [`ResolverProvider`] holds the factory that is
//! currently installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use clusternet::dns::{MockResolverFactory, ResolverProvider};
//!
//! let factory = MockResolverFactory::new();
//! factory.update_addrs("test.cluster.fake", ["127.0.1.1".parse().unwrap()]);
//! let provider = ResolverProvider::new(factory);
//! ```

mod factory;
mod gai;
mod hickory;
mod mock;
mod provider;
mod resolve;

pub use factory::{
    GaiResolverFactory, HickoryResolverFactory, MockResolverFactory, OverridesResolverFactory,
    ResolverFactory,
};
pub use gai::{parse_ip_literal, GaiResolver, SocketAddrs};
pub use hickory::HickoryResolver;
pub use mock::MockResolver;
pub use provider::ResolverProvider;
pub use resolve::{
    resolve_with_timeout, DnsResolverWithOverrides, Name, Resolve, ResolverResponse, Resolving,
    ValidResponse,
};
