//! Cookie-backed session store.
//!
//! This crate provides:
//! - Sealing/opening of the session cookie payload (ChaCha20-Poly1305,
//!   key derived from the deployment's cookie secret)
//! - The [`SessionStore`] that reads, writes and clears the session cookie
//!   and the separate long-lived refresh-token cookie

mod seal;
mod store;

pub use seal::{derive_cookie_key, open, seal, SealError, COOKIE_KEY_SIZE};
pub use store::{SessionStore, REFRESH_COOKIE, SESSION_COOKIE};
