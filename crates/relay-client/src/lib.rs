//! Relay service client.
//!
//! The relay performs OAuth and email exchanges on behalf of deployments
//! that do not hold provider secrets themselves. This crate provides:
//! - Login-initiation calls for the GitHub, Google and magic-link providers
//! - The exchange-token redemption used by the callback flow
//! - Project lookup and SaaS-side GitHub user validation
//! - Refresh-token redemption for relay-established sessions

mod client;
mod error;
mod types;

pub use client::RelayClient;
pub use error::{RelayError, RelayResult};
pub use types::{ExchangePayload, ExchangeSession, ExchangeUser, ProjectInfo, RefreshPayload};
