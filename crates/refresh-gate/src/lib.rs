//! Coordinated token refresh.
//!
//! This crate provides:
//! - [`RefreshGate`] - at-most-one refresh in flight per execution context,
//!   with waiters sharing the in-flight outcome instead of issuing their own
//!   calls
//! - [`ContextBus`] - the value-only broadcast channel contexts use to
//!   advertise an advisory refresh lock to each other
//! - [`HttpSessionRefresher`] - the production refresher that drives the
//!   local refresh and user-info endpoints
//!
//! Cross-context exclusion is advisory by design: contexts share no memory,
//! so the lock reduces the thundering herd rather than guaranteeing
//! exclusivity, and the refresh endpoint is expected to tolerate the
//! occasional duplicate.

mod bus;
mod coordinator;
mod error;
mod http;
mod machine;

pub use bus::{ContextBus, RefreshSignal};
pub use coordinator::{
    GateConfig, ReadsInvalidatedCallback, RefreshGate, SessionRefresher, SessionUpdatedCallback,
};
pub use error::{RefreshError, RefreshResult};
pub use http::HttpSessionRefresher;
