//! Current-session handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::AppState;

/// `GET /user` - the session behind the cookie, without the refresh token.
pub async fn user(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.store.read(&jar) {
        Some(session) => Json(json!({ "session": session })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "not authenticated" })),
        )
            .into_response(),
    }
}
