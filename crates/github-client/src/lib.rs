//! Git-hosting provider client.
//!
//! This crate provides:
//! - Authorization-code and refresh-token exchanges against the provider's
//!   OAuth token endpoint
//! - User profile fetch with primary-email fallback
//! - The direct collaborator authorization check

mod client;
mod error;

pub use client::{GithubClient, GithubUser, TokenSet, DEFAULT_API_BASE, DEFAULT_OAUTH_BASE};
pub use error::{GithubError, GithubResult};
