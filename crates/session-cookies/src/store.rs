//! Session and refresh-token cookie operations.

use auth_core::{Session, StoredSession};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::debug;

use crate::seal::{self, SealError, COOKIE_KEY_SIZE};

/// Name of the sealed session cookie.
pub const SESSION_COOKIE: &str = "ost_session";

/// Name of the HTTP-only refresh-token cookie.
pub const REFRESH_COOKIE: &str = "ost_refresh_token";

/// Lifetime of both cookies.
const COOKIE_MAX_AGE_DAYS: i64 = 30;

/// Reads and writes the session cookie pair.
///
/// The session cookie holds the sealed [`StoredSession`] payload; the
/// refresh token lives in its own HTTP-only cookie and is never exposed to
/// in-page script. Both are written together from one validated [`Session`]
/// and cleared together on sign-out.
#[derive(Clone)]
pub struct SessionStore {
    key: [u8; COOKIE_KEY_SIZE],
    secure: bool,
}

impl SessionStore {
    /// Create a store sealing with a key derived from `cookie_secret`.
    ///
    /// `secure` marks both cookies `Secure` and should be on for production
    /// deployments.
    pub fn new(cookie_secret: &str, secure: bool) -> Self {
        Self {
            key: seal::derive_cookie_key(cookie_secret),
            secure,
        }
    }

    /// Read the session from the jar.
    ///
    /// Returns `None` for a missing, corrupt or foreign-keyed cookie; a
    /// cookie that fails to open is treated the same as no session.
    pub fn read(&self, jar: &CookieJar) -> Option<StoredSession> {
        let cookie = jar.get(SESSION_COOKIE)?;
        let plaintext = match seal::open(&self.key, cookie.value()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable session cookie");
                return None;
            }
        };
        match serde_json::from_slice(&plaintext) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(error = %e, "Discarding malformed session cookie payload");
                None
            }
        }
    }

    /// Read the refresh token from its cookie.
    pub fn refresh_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }

    /// Write both cookies from a validated session.
    pub fn write(&self, jar: CookieJar, session: &Session) -> Result<CookieJar, SealError> {
        let payload = serde_json::to_vec(&session.stored())
            .map_err(|e| SealError::Seal(e.to_string()))?;
        let sealed = seal::seal(&self.key, &payload)?;

        let session_cookie = self.build_cookie(SESSION_COOKIE, sealed);
        let refresh_cookie = self.build_cookie(REFRESH_COOKIE, session.refresh_token.clone());

        Ok(jar.add(session_cookie).add(refresh_cookie))
    }

    /// Remove both cookies.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(removal_cookie(SESSION_COOKIE))
            .remove(removal_cookie(REFRESH_COOKIE))
    }

    fn build_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
            .build()
    }
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
