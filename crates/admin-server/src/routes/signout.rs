//! Sign-out handler.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use tracing::info;

use crate::AppState;

/// `GET|POST /signout` - clear both cookies and send the browser back to
/// the login surface.
pub async fn signout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = state.store.clear(jar);
    info!("Signed out");
    (
        jar,
        Redirect::temporary(&state.config.dashboard_path()),
    )
        .into_response()
}
