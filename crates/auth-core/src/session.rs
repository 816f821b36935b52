//! Session types shared across the login flow, cookie store and client runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a session was established.
///
/// The provider only records the establishment path; it does not change how
/// subsequent authenticated requests behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    Github,
    MagicLink,
    Google,
}

impl Provider {
    /// Wire name used in serialized sessions and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::MagicLink => "magic-link",
            Provider::Google => "google",
        }
    }
}

/// Identity fields of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    /// Unique handle. When the provider omits one, the login flow falls back
    /// to the user's email before constructing the session.
    pub login: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// The authenticated identity held on behalf of the admin client.
///
/// A `Session` is only ever constructed from a fully validated exchange
/// payload; partial payloads never become sessions. The refresh token is
/// carried here only between exchange and cookie write - the serialized
/// session cookie payload ([`StoredSession`]) excludes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    pub provider: Provider,
    /// Opaque short-lived bearer credential.
    pub access_token: String,
    /// Opaque long-lived credential, persisted in its own HTTP-only cookie.
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    /// When the exchange payload supplies only a relative lifetime, this is
    /// derived as now + lifetime at session creation.
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether the access token has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// The session as stored in the sealed session cookie and returned by
    /// the user-info endpoint: everything except the refresh token.
    pub fn stored(&self) -> StoredSession {
        StoredSession {
            user: self.user.clone(),
            provider: self.provider,
            access_token: self.access_token.clone(),
            expires_at: self.expires_at,
            refresh_token_expires_at: self.refresh_token_expires_at,
        }
    }
}

/// Serializable session view with the refresh token stripped.
///
/// This is the payload sealed into the session cookie and the shape served
/// by `GET /user`; the refresh token lives exclusively in its own cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: SessionUser,
    pub provider: Provider,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    /// Whether the access token has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Rejoin with a refresh token read from its own cookie.
    pub fn with_refresh_token(
        self,
        refresh_token: String,
    ) -> Session {
        Session {
            user: self.user,
            provider: self.provider,
            access_token: self.access_token,
            refresh_token,
            expires_at: self.expires_at,
            refresh_token_expires_at: self.refresh_token_expires_at,
        }
    }
}
