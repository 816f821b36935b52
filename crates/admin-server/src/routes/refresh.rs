//! Refresh redemption handler.

use auth_core::{Provider, Session, StoredSession};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::AppState;

/// Lifetime assumed for a renewed provider token that reports none.
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 28_800;

#[derive(Error, Debug)]
enum RedeemError {
    #[error("no refresh backend configured")]
    NotConfigured,
    #[error(transparent)]
    Github(#[from] github_client::GithubError),
    #[error(transparent)]
    Relay(#[from] relay_client::RelayError),
}

/// `POST /refresh` - no body; the refresh cookie identifies the caller.
///
/// Redeems the refresh token against the backend that issued it and
/// rewrites both cookies. Irrecoverable failures clear the cookies so the
/// client falls back to a fresh login.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (Some(stored), Some(refresh_token)) =
        (state.store.read(&jar), state.store.refresh_token(&jar))
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false })),
        )
            .into_response();
    };

    match redeem(&state, &stored, &refresh_token).await {
        Ok(session) => match state.store.write(jar, &session) {
            Ok(jar) => {
                info!(login = %session.user.login, "Session refreshed");
                (jar, Json(json!({ "success": true }))).into_response()
            }
            Err(e) => {
                warn!(error = %e, "Failed to write refreshed session cookies");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false })),
                )
                    .into_response()
            }
        },
        Err(e) => {
            warn!(error = %e, "Refresh redemption failed; clearing session");
            let jar = state.store.clear(jar);
            (jar, Json(json!({ "success": false }))).into_response()
        }
    }
}

/// Redeem against whichever backend issued the session's tokens: the
/// provider token endpoint for locally established github sessions, the
/// relay for everything else.
async fn redeem(
    state: &AppState,
    stored: &StoredSession,
    refresh_token: &str,
) -> Result<Session, RedeemError> {
    if stored.provider == Provider::Github {
        if let Some(github) = state.github.as_ref() {
            let tokens = github.refresh(refresh_token).await?;
            let now = Utc::now();
            return Ok(Session {
                user: stored.user.clone(),
                provider: stored.provider,
                refresh_token: tokens
                    .refresh_token
                    .unwrap_or_else(|| tokens.access_token.clone()),
                access_token: tokens.access_token,
                expires_at: now
                    + Duration::seconds(
                        tokens.expires_in.unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
                    ),
                refresh_token_expires_at: tokens
                    .refresh_token_expires_in
                    .map(|secs| now + Duration::seconds(secs)),
            });
        }
    }

    let relay = state.relay.as_ref().ok_or(RedeemError::NotConfigured)?;
    let payload = relay.refresh_session(refresh_token).await?;
    let now = Utc::now();

    Ok(Session {
        user: stored.user.clone(),
        provider: stored.provider,
        access_token: payload.session.access_token,
        refresh_token: payload.session.refresh_token,
        expires_at: payload.session.expires_at,
        refresh_token_expires_at: payload.session.refresh_token_expires_at.or_else(|| {
            payload
                .session
                .refresh_token_expires_in
                .map(|secs| now + Duration::seconds(secs))
        }),
    })
}
