//! Connection establishment.
//!
//! - [`transport`]: opening a connection to one socket address
//! - [`connectjob`]: endpoint → (deferred DNS) → connection flow

pub mod connectjob;
pub mod transport;
