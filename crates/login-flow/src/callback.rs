//! Callback exchange: turn an inbound callback request into a validated
//! session or an error redirect.

use auth_core::{AuthErrorCode, CallbackOutcome, Provider, Session, SessionUser};
use chrono::{Duration, Utc};
use github_client::{GithubUser, TokenSet};
use relay_client::{ExchangePayload, RelayError};
use tracing::{info, warn};
use url::Url;

use crate::LoginFlow;

/// Access-token lifetime assumed when the provider issues a non-expiring
/// token and reports no lifetime.
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 28_800;

/// Query parameters of an inbound callback request.
///
/// `error` and the token parameters are mutually exclusive; an `error`
/// short-circuits straight to a dashboard redirect carrying that code.
#[derive(Debug, Clone, Default)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub exchange_token: Option<String>,
    pub error: Option<String>,
}

/// Result of a callback exchange.
///
/// The session is present only when the outcome is a clean redirect; error
/// outcomes never carry one, so no cookie is ever written on a failed path.
#[derive(Debug)]
pub struct CallbackResult {
    pub outcome: CallbackOutcome,
    pub session: Option<Session>,
}

impl CallbackResult {
    fn success(target: impl Into<String>, session: Session) -> Self {
        Self {
            outcome: CallbackOutcome::success(target),
            session: Some(session),
        }
    }

    fn failure(target: impl Into<String>, code: AuthErrorCode) -> Self {
        Self {
            outcome: CallbackOutcome::failure(target, code),
            session: None,
        }
    }
}

impl LoginFlow {
    /// Handle the OAuth/exchange callback.
    ///
    /// Driven by which of the mutually exclusive query parameters is
    /// present: a provider `error`, a relay `exchange_token`, or an
    /// authorization `code`.
    pub async fn handle_callback(&self, query: &CallbackQuery) -> CallbackResult {
        if let Some(error) = query.error.as_deref() {
            return self.failure(inbound_error_code(error));
        }

        if let Some(exchange_token) = query.exchange_token.as_deref() {
            return match self.exchange_relay_token(exchange_token).await {
                Ok(session) => self.success(session),
                Err(code) => self.failure(code),
            };
        }

        if let Some(code) = query.code.as_deref() {
            return self.exchange_authorization_code(code).await;
        }

        warn!("Callback carried neither code, exchange token nor error");
        self.failure(AuthErrorCode::CallbackError)
    }

    /// Handle the magic-link callback.
    ///
    /// Performs the same exchange, but additionally honors a `return_url`
    /// from the exchange response - only after verifying its origin equals
    /// `request_origin`. A mismatch is `callback_error`, never a silent
    /// redirect, and aborts before any cookie write.
    pub async fn handle_magic_link_callback(
        &self,
        query: &CallbackQuery,
        request_origin: &str,
    ) -> CallbackResult {
        if let Some(error) = query.error.as_deref() {
            return self.failure(inbound_error_code(error));
        }

        let Some(exchange_token) = query.exchange_token.as_deref() else {
            warn!("Magic-link callback carried no exchange token");
            return self.failure(AuthErrorCode::CallbackError);
        };

        let relay = match self.relay.as_ref() {
            Some(relay) => relay,
            None => return self.failure(AuthErrorCode::AuthNotConfigured),
        };

        let payload = match relay
            .exchange_token(exchange_token, &self.magic_link_callback_url)
            .await
        {
            Ok(payload) => payload,
            Err(e) => return self.failure(magic_link_exchange_code(e)),
        };

        let return_url = payload.return_url.clone();
        let session = session_from_exchange(payload);

        match return_url {
            Some(target) => {
                if same_origin(&target, request_origin) {
                    info!(login = %session.user.login, "Magic-link login with return URL");
                    CallbackResult::success(target, session)
                } else {
                    warn!(return_url = %target, "Rejected cross-origin return URL");
                    self.failure(AuthErrorCode::CallbackError)
                }
            }
            None => {
                info!(login = %session.user.login, "Magic-link login");
                self.success(session)
            }
        }
    }

    /// Redeem a relay exchange token into a session.
    async fn exchange_relay_token(&self, exchange_token: &str) -> Result<Session, AuthErrorCode> {
        let relay = self
            .relay
            .as_ref()
            .ok_or(AuthErrorCode::AuthNotConfigured)?;

        let payload = relay
            .exchange_token(exchange_token, &self.callback_url)
            .await
            .map_err(callback_exchange_code)?;

        let session = session_from_exchange(payload);
        info!(login = %session.user.login, provider = %session.provider.as_str(), "Exchange-token login");
        Ok(session)
    }

    /// The direct-provider branch: code exchange, profile fetch, then the
    /// collaborator authorization check with optional SaaS-side override.
    async fn exchange_authorization_code(&self, code: &str) -> CallbackResult {
        let Some(github) = self.github.as_ref() else {
            return self.failure(AuthErrorCode::AuthNotConfigured);
        };

        let tokens = match github.exchange_code(code, self.local_callback_url()).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Provider code exchange failed");
                return self.failure(AuthErrorCode::SessionError);
            }
        };

        let user = match github.fetch_user(&tokens.access_token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Provider profile fetch failed");
                return self.failure(AuthErrorCode::SessionError);
            }
        };

        let collaborator = match github
            .is_collaborator(
                &tokens.access_token,
                &self.repo_owner,
                &self.repo_slug,
                &user.login,
            )
            .await
        {
            Ok(collaborator) => collaborator,
            Err(e) => {
                warn!(error = %e, "Collaborator check failed");
                return self.failure(AuthErrorCode::SessionError);
            }
        };

        if collaborator {
            info!(login = %user.login, "Collaborator login");
            return self.success(session_from_provider(user, tokens));
        }

        // Not a collaborator. A deployment with a relay key gets one more
        // chance: SaaS-side membership can override the repository check.
        let Some(relay) = self.relay.as_ref() else {
            warn!(login = %user.login, "User is not a collaborator");
            return self.failure(AuthErrorCode::NotCollaborator);
        };

        let project_id = match relay.fetch_project().await {
            Ok(project) => project.id,
            Err(e) => {
                warn!(error = %e, "Project lookup failed during membership validation");
                return self.failure(AuthErrorCode::NotCollaborator);
            }
        };

        match relay
            .validate_github_user(&tokens.access_token, project_id.as_deref())
            .await
        {
            Ok(exchange_token) => {
                info!(login = %user.login, "SaaS membership overrides collaborator check");
                match self.exchange_relay_token(&exchange_token).await {
                    Ok(session) => self.success(session),
                    Err(code) => self.failure(code),
                }
            }
            Err(e) => {
                warn!(error = %e, login = %user.login, "Membership validation failed");
                self.failure(AuthErrorCode::NotCollaborator)
            }
        }
    }

    fn local_callback_url(&self) -> Option<&str> {
        match &self.mode {
            admin_config::LoginMode::Local { callback_url, .. } => callback_url.as_deref(),
            _ => None,
        }
    }

    fn success(&self, session: Session) -> CallbackResult {
        CallbackResult::success(self.dashboard_path.clone(), session)
    }

    fn failure(&self, code: AuthErrorCode) -> CallbackResult {
        CallbackResult::failure(self.dashboard_path.clone(), code)
    }
}

/// Build a session from a validated relay exchange payload.
///
/// The payload has already passed the schema check; all that is left is the
/// login fallback and expiry derivation.
fn session_from_exchange(payload: ExchangePayload) -> Session {
    let now = Utc::now();
    let login = payload
        .user
        .login
        .unwrap_or_else(|| payload.user.email.clone());
    let name = payload.user.name.unwrap_or_else(|| login.clone());

    let refresh_token_expires_at = payload.session.refresh_token_expires_at.or_else(|| {
        payload
            .session
            .refresh_token_expires_in
            .map(|secs| now + Duration::seconds(secs))
    });

    Session {
        user: SessionUser {
            name,
            login,
            email: payload.user.email,
            avatar_url: payload.user.avatar_url,
        },
        provider: payload.provider.unwrap_or(Provider::MagicLink),
        access_token: payload.session.access_token,
        refresh_token: payload.session.refresh_token,
        expires_at: payload.session.expires_at,
        refresh_token_expires_at,
    }
}

/// Build a session from a provider token set and profile.
fn session_from_provider(user: GithubUser, tokens: TokenSet) -> Session {
    let now = Utc::now();
    let email = user.email.unwrap_or_else(|| user.login.clone());
    let name = user.name.unwrap_or_else(|| user.login.clone());

    // Classic OAuth apps issue one non-rotating token; it then doubles as
    // the long-lived credential.
    let refresh_token = tokens
        .refresh_token
        .unwrap_or_else(|| tokens.access_token.clone());

    Session {
        user: SessionUser {
            name,
            login: user.login,
            email,
            avatar_url: user.avatar_url,
        },
        provider: Provider::Github,
        access_token: tokens.access_token,
        refresh_token,
        expires_at: now
            + Duration::seconds(tokens.expires_in.unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS)),
        refresh_token_expires_at: tokens
            .refresh_token_expires_in
            .map(|secs| now + Duration::seconds(secs)),
    }
}

/// Map an inbound `error` query parameter onto the closed vocabulary.
///
/// Only recognized codes pass through to the dashboard; anything else
/// collapses to `callback_error` so arbitrary strings never ride our
/// redirect query.
fn inbound_error_code(error: &str) -> AuthErrorCode {
    error
        .parse::<AuthErrorCode>()
        .unwrap_or(AuthErrorCode::CallbackError)
}

/// Error mapping for the exchange-token branch of the main callback.
fn callback_exchange_code(error: RelayError) -> AuthErrorCode {
    match error {
        RelayError::InvalidData(_) => AuthErrorCode::InvalidData,
        RelayError::InvalidToken { .. } => AuthErrorCode::InvalidToken,
        RelayError::Known { code, .. } => code,
        RelayError::Failed(_) => AuthErrorCode::SessionError,
    }
}

/// Error mapping for the magic-link callback, which reports exchange
/// rejections as `session-error`.
fn magic_link_exchange_code(error: RelayError) -> AuthErrorCode {
    match error {
        RelayError::InvalidData(_) => AuthErrorCode::InvalidData,
        RelayError::InvalidToken { .. } => AuthErrorCode::SessionError,
        RelayError::Known { code, .. } => code,
        RelayError::Failed(_) => AuthErrorCode::SessionError,
    }
}

/// Compare the origin (scheme, host, port) of `target` against the
/// request's own origin.
fn same_origin(target: &str, request_origin: &str) -> bool {
    let Ok(target) = Url::parse(target) else {
        return false;
    };
    let Ok(origin) = Url::parse(request_origin) else {
        return false;
    };
    target.origin() == origin.origin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_client::{ExchangeSession, ExchangeUser};

    fn payload(login: Option<&str>) -> ExchangePayload {
        serde_json::from_value(serde_json::json!({
            "user": {
                "email": "ada@example.com",
                "login": login,
            },
            "session": {
                "access_token": "at",
                "refresh_token": "rt",
                "expires_at": "2026-08-07T12:00:00Z",
            },
        }))
        .unwrap()
    }

    #[test]
    fn login_falls_back_to_email_when_absent() {
        let session = session_from_exchange(payload(None));
        assert_eq!(session.user.login, "ada@example.com");
        assert_eq!(session.user.email, "ada@example.com");
    }

    #[test]
    fn login_is_kept_when_present() {
        let session = session_from_exchange(payload(Some("ada")));
        assert_eq!(session.user.login, "ada");
    }

    #[test]
    fn exchange_sessions_default_to_magic_link() {
        let session = session_from_exchange(payload(Some("ada")));
        assert_eq!(session.provider, Provider::MagicLink);
    }

    #[test]
    fn relative_refresh_lifetime_becomes_absolute() {
        let payload = ExchangePayload {
            user: ExchangeUser {
                email: "ada@example.com".to_string(),
                login: None,
                name: None,
                avatar_url: None,
            },
            session: ExchangeSession {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
                refresh_token_expires_at: None,
                refresh_token_expires_in: Some(3600),
            },
            provider: None,
            return_url: None,
        };

        let before = Utc::now();
        let session = session_from_exchange(payload);
        let expiry = session.refresh_token_expires_at.unwrap();
        assert!(expiry >= before + Duration::seconds(3600));
        assert!(expiry <= Utc::now() + Duration::seconds(3600));
    }

    #[test]
    fn provider_session_reuses_token_when_no_refresh_token() {
        let user = GithubUser {
            login: "ada".to_string(),
            name: None,
            email: Some("ada@example.com".to_string()),
            avatar_url: None,
        };
        let tokens = TokenSet {
            access_token: "gho_access".to_string(),
            refresh_token: None,
            expires_in: None,
            refresh_token_expires_in: None,
        };

        let session = session_from_provider(user, tokens);
        assert_eq!(session.refresh_token, "gho_access");
        assert_eq!(session.provider, Provider::Github);
    }

    #[test]
    fn same_origin_comparison() {
        assert!(same_origin(
            "https://site.example.com/outstatic",
            "https://site.example.com"
        ));
        assert!(!same_origin(
            "https://evil.example.com/outstatic",
            "https://site.example.com"
        ));
        assert!(!same_origin(
            "https://site.example.com:8443/outstatic",
            "https://site.example.com"
        ));
        assert!(!same_origin("not a url", "https://site.example.com"));
    }

    #[test]
    fn unknown_inbound_error_codes_collapse_to_callback_error() {
        assert_eq!(
            inbound_error_code("not-collaborator"),
            AuthErrorCode::NotCollaborator
        );
        assert_eq!(
            inbound_error_code("<script>alert(1)</script>"),
            AuthErrorCode::CallbackError
        );
    }
}
