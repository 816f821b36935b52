//! Relay response payloads.

use auth_core::Provider;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Payload returned by the relay's exchange-token endpoint.
///
/// Deserialization is the schema check: `user.email`,
/// `session.access_token`, `session.refresh_token` and `session.expires_at`
/// are required, everything else is optional. A payload missing any required
/// field never becomes a session.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangePayload {
    pub user: ExchangeUser,
    pub session: ExchangeSession,
    /// Which upstream provider the relay authenticated against, when it
    /// says. Absent means a plain magic-link session.
    #[serde(default)]
    pub provider: Option<Provider>,
    /// Post-login redirect target. Only honored by the magic-link callback
    /// route, and only after same-origin validation.
    #[serde(default)]
    pub return_url: Option<String>,
}

/// User identity inside an exchange payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeUser {
    pub email: String,
    /// Optional and nullable; the session's login falls back to the email.
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Token material inside an exchange payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    /// Absolute refresh-token expiry, when the relay reports one.
    #[serde(default)]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// Relative refresh-token lifetime in seconds, used to derive the
    /// absolute expiry at session creation when no absolute value is given.
    #[serde(default)]
    pub refresh_token_expires_in: Option<i64>,
}

/// Payload returned by the relay's refresh-token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshPayload {
    pub session: ExchangeSession,
}

/// Relay project record for this deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_payload_deserializes() {
        let payload: ExchangePayload = serde_json::from_value(serde_json::json!({
            "user": {
                "email": "ada@example.com",
                "login": "ada",
                "name": "Ada Lovelace",
                "avatar_url": "https://avatars.example.com/ada",
            },
            "session": {
                "access_token": "at",
                "refresh_token": "rt",
                "expires_at": "2026-08-07T12:00:00Z",
                "refresh_token_expires_in": 2592000,
            },
            "provider": "google",
            "return_url": "https://site.example.com/outstatic",
        }))
        .unwrap();

        assert_eq!(payload.user.login.as_deref(), Some("ada"));
        assert_eq!(payload.provider, Some(Provider::Google));
        assert_eq!(payload.session.refresh_token_expires_in, Some(2592000));
    }

    #[test]
    fn login_may_be_null() {
        let payload: ExchangePayload = serde_json::from_value(serde_json::json!({
            "user": {"email": "ada@example.com", "login": null},
            "session": {
                "access_token": "at",
                "refresh_token": "rt",
                "expires_at": "2026-08-07T12:00:00Z",
            },
        }))
        .unwrap();
        assert_eq!(payload.user.login, None);
    }

    #[test]
    fn missing_refresh_token_is_a_schema_violation() {
        let result = serde_json::from_value::<ExchangePayload>(serde_json::json!({
            "user": {"email": "ada@example.com"},
            "session": {
                "access_token": "at",
                "expires_at": "2026-08-07T12:00:00Z",
            },
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_email_is_a_schema_violation() {
        let result = serde_json::from_value::<ExchangePayload>(serde_json::json!({
            "user": {"login": "ada"},
            "session": {
                "access_token": "at",
                "refresh_token": "rt",
                "expires_at": "2026-08-07T12:00:00Z",
            },
        }));
        assert!(result.is_err());
    }
}
