//! OAuth/exchange callback handler.

use auth_core::{AuthErrorCode, CallbackOutcome};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use login_flow::{CallbackQuery, CallbackResult};
use serde::Deserialize;
use tracing::error;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    exchange_token: Option<String>,
    error: Option<String>,
}

impl From<CallbackParams> for CallbackQuery {
    fn from(params: CallbackParams) -> Self {
        CallbackQuery {
            code: params.code,
            exchange_token: params.exchange_token,
            error: params.error,
        }
    }
}

/// `GET /callback` - run the exchange state machine, persist the session on
/// success, and conclude with a 307 either way.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let result = state.flow.handle_callback(&params.into()).await;
    finish(&state, jar, result)
}

/// Write cookies for a successful exchange and emit the redirect. Shared
/// with the magic-link callback.
pub(super) fn finish(state: &AppState, jar: CookieJar, result: CallbackResult) -> Response {
    let (outcome, jar) = match result.session {
        Some(session) => match state.store.write(jar, &session) {
            Ok(jar) => (result.outcome, jar),
            Err(e) => {
                // The exchange succeeded but the cookie write did not; the
                // browser still gets a redirect, just with an error code.
                error!(error = %e, "Failed to write session cookies");
                let target = state.flow.dashboard_path().to_string();
                (
                    CallbackOutcome::failure(target, AuthErrorCode::SessionError),
                    state.store.clear(CookieJar::new()),
                )
            }
        },
        None => (result.outcome, jar),
    };

    (jar, Redirect::temporary(&outcome.location())).into_response()
}
