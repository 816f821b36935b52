//! Authenticated request wrapper.
//!
//! This crate provides:
//! - [`AuthedClient`] - wraps outbound authenticated calls; a 401/403 on the
//!   first attempt triggers one coordinated refresh and exactly one retry
//! - [`CredentialScheme`] - the per-API authorization header scheme
//! - [`CredentialCell`] - the shared in-memory credential the refresh
//!   callback updates

mod client;
mod scheme;

pub use client::{AuthedClient, AuthedClientError, CredentialCell};
pub use scheme::CredentialScheme;
