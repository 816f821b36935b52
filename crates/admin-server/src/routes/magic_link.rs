//! Magic-link callback handler.

use auth_core::{AuthErrorCode, CallbackOutcome};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use tracing::error;

use super::callback::{finish, CallbackParams};
use crate::AppState;

/// `GET /magic-link-callback` - the exchange plus same-origin validation of
/// the relay-supplied return URL.
pub async fn magic_link_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let origin = match state.config.public_origin() {
        Ok(origin) => origin,
        Err(e) => {
            error!(error = %e, "Cannot determine own origin; refusing redirect");
            let target = state.flow.dashboard_path().to_string();
            let outcome = CallbackOutcome::failure(target, AuthErrorCode::CallbackError);
            return (jar, Redirect::temporary(&outcome.location())).into_response();
        }
    };

    let result = state
        .flow
        .handle_magic_link_callback(&params.into(), &origin)
        .await;
    finish(&state, jar, result)
}
