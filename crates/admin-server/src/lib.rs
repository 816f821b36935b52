//! HTTP surface of the admin session service.
//!
//! Routes are mounted under `{base_path}/api/outstatic`:
//! - `GET  /login` - login initiation, JSON response
//! - `GET  /login/google` - login initiation, redirect variant
//! - `GET  /callback` - OAuth/exchange callback
//! - `GET  /magic-link-callback` - magic-link callback with origin check
//! - `POST /refresh` - redeem the refresh cookie for new tokens
//! - `GET  /user` - current session
//! - `GET/POST /signout` - clear both cookies

mod routes;
mod state;

pub use routes::router;
pub use state::AppState;
