//! Login initiation and callback exchange.
//!
//! This crate provides:
//! - [`LoginFlow::initiate`] - the three-way login decision (local OAuth,
//!   relay-mediated, unconfigured), resolved from configuration once at
//!   startup
//! - [`LoginFlow::handle_callback`] - the protocol state machine that turns
//!   an inbound callback into a validated session or an error redirect
//! - [`LoginFlow::handle_magic_link_callback`] - the magic-link variant with
//!   same-origin validation of the post-login redirect target

mod callback;
mod error;
mod flow;
mod initiator;

pub use callback::{CallbackQuery, CallbackResult};
pub use error::InitiateError;
pub use flow::LoginFlow;
