//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): error taxonomy for resolution and bootstrap
//! - [`IoResultExt`](context::IoResultExt): context helpers for IO results and deadlines

pub mod context;
pub mod neterror;
