//! Route registration.

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

mod callback;
mod login;
mod magic_link;
mod refresh;
mod signout;
mod user;

/// Build the application router with the auth routes mounted under the
/// configured base path.
pub fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/login", get(login::login))
        .route("/login/google", get(login::google_login))
        .route("/callback", get(callback::callback))
        .route("/magic-link-callback", get(magic_link::magic_link_callback))
        .route("/refresh", post(refresh::refresh))
        .route("/user", get(user::user))
        .route("/signout", get(signout::signout).post(signout::signout));

    Router::new()
        .nest(&state.config.api_base(), auth)
        .with_state(state)
}
