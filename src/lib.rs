//! # clusternet
//!
//! Contact point resolution and node bookkeeping for distributed database
//! clients.
//!
//! `clusternet` turns the `host:port` contact points a client is configured
//! with into endpoints, opens the first control connection, and keeps a
//! duplicate-free registry of cluster nodes while the control connection
//! reports topology changes.
//!
//! ## Features
//!
//! - **Pluggable Resolution**: system resolver, hickory-dns, static overrides
//!   or an in-memory mock, chosen through an injected provider
//! - **Deferred Resolution**: hostnames can be kept unresolved and looked up
//!   every time a connection is opened
//! - **Topology Reconciliation**: one node per endpoint identity, even when
//!   a hostname shows up both resolved and unresolved
//! - **Lock-free Reads**: registry snapshots published with an atomic swap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use clusternet::config::ResolutionConfig;
//! use clusternet::session::Session;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ResolutionConfig::new().contact_points(["db.example.com:9042"]);
//!     let session = Session::builder(config).connect().await.unwrap();
//!     for node in session.metadata().iter() {
//!         println!("{node}");
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`config`] - Resolution options
//! - [`dns`] - Resolvers, factories and the resolver provider
//! - [`metadata`] - Endpoints, nodes, registry and reconciler
//! - [`session`] - Contact points, retries and session bootstrap
//! - [`socket`] - Transports and connect jobs

pub mod base;
pub mod config;
pub mod dns;
pub mod metadata;
pub mod session;
pub mod socket;
