//! Configuration and logging for the admin session service.
//!
//! This crate provides:
//! - Environment-driven [`AdminConfig`] consumed by the login flow and server
//! - Tracing initialization shared by the server binary and tests

mod config;
mod logging;

pub use config::{AdminConfig, ConfigError, LoginMode, DEV_COOKIE_SECRET};
pub use logging::init_logging;
