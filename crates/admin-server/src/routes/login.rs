//! Login initiation handlers.

use auth_core::{AuthErrorCode, CallbackOutcome, Provider};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    provider: Option<String>,
    email: Option<String>,
    return_url: Option<String>,
}

/// `GET /login` - returns the URL to send the browser to as JSON, or a
/// structured JSON error with the matching status.
pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Response {
    let provider = match parse_provider(params.provider.as_deref()) {
        Ok(provider) => provider,
        Err(response) => return response,
    };

    match state
        .flow
        .initiate(provider, params.email.as_deref(), params.return_url.as_deref())
        .await
    {
        Ok(url) => Json(json!({ "url": url })).into_response(),
        Err(error) => {
            warn!(error = %error, "Login initiation failed");
            let status =
                StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = match error.code() {
                Some(code) => json!({ "error": code.as_str() }),
                None => json!({ "error": error.to_string() }),
            };
            (status, Json(body)).into_response()
        }
    }
}

/// `GET /login/google` - the redirect variant used by deployments that link
/// to login from an anchor tag. Succeeds with a 302 to the relay URL; fails
/// with a redirect back to the caller's return URL carrying the error code.
pub async fn google_login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Response {
    let result = state
        .flow
        .initiate(Provider::Google, None, params.return_url.as_deref())
        .await;

    match result {
        Ok(url) => found(&url),
        Err(error) => {
            warn!(error = %error, "Google login initiation failed");
            let target = params
                .return_url
                .unwrap_or_else(|| state.flow.dashboard_path().to_string());
            let code = error.code().unwrap_or(AuthErrorCode::GoogleRelayFailed);
            found(&CallbackOutcome::failure(target, code).location())
        }
    }
}

fn parse_provider(provider: Option<&str>) -> Result<Provider, Response> {
    match provider {
        Some("github") | None => Ok(Provider::Github),
        Some("magic-link") => Ok(Provider::MagicLink),
        Some("google") => Ok(Provider::Google),
        Some(other) => {
            warn!(provider = %other, "Unknown login provider requested");
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("unknown provider: {other}") })),
            )
                .into_response())
        }
    }
}

/// Plain 302; the anchor-tag flow expects a classic found redirect rather
/// than a 307.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
