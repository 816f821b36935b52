//! The closed vocabulary of error codes surfaced to the admin client.
//!
//! Every failure that reaches the browser - as a redirect query parameter or
//! a structured JSON error - is one of these codes. Internal relay or
//! provider details never leak past this boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable error code carried in redirect query strings and JSON
/// error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthErrorCode {
    /// Neither local OAuth credentials nor a relay API key are configured.
    AuthNotConfigured,
    /// The relay rejected the deployment's API key.
    InvalidApiKey,
    /// The relay has no project URL on file for this deployment.
    ProjectUrlNotConfigured,
    /// The callback URL's domain is not allowed by the relay project.
    InvalidCallbackDomain,
    /// The callback URL's path is not allowed by the relay project.
    InvalidCallbackTarget,
    /// Any unrecognized relay failure during GitHub login initiation.
    GithubRelayFailed,
    /// Any unrecognized relay failure during Google login initiation.
    GoogleRelayFailed,
    /// Any unrecognized relay failure during magic-link initiation.
    MagicLinkRelayFailed,
    /// Authenticated with the provider but not authorized for the repository.
    NotCollaborator,
    /// The relay refused the exchange token.
    #[serde(rename = "invalid_token")]
    InvalidToken,
    /// The exchange payload did not match the required schema.
    #[serde(rename = "invalid_data")]
    InvalidData,
    /// The post-login redirect target failed origin validation.
    #[serde(rename = "callback_error")]
    CallbackError,
    /// The relay exchange failed while completing a magic-link callback.
    SessionError,
}

impl AuthErrorCode {
    /// Query-string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::AuthNotConfigured => "auth-not-configured",
            AuthErrorCode::InvalidApiKey => "invalid-api-key",
            AuthErrorCode::ProjectUrlNotConfigured => "project-url-not-configured",
            AuthErrorCode::InvalidCallbackDomain => "invalid-callback-domain",
            AuthErrorCode::InvalidCallbackTarget => "invalid-callback-target",
            AuthErrorCode::GithubRelayFailed => "github-relay-failed",
            AuthErrorCode::GoogleRelayFailed => "google-relay-failed",
            AuthErrorCode::MagicLinkRelayFailed => "magic-link-relay-failed",
            AuthErrorCode::NotCollaborator => "not-collaborator",
            AuthErrorCode::InvalidToken => "invalid_token",
            AuthErrorCode::InvalidData => "invalid_data",
            AuthErrorCode::CallbackError => "callback_error",
            AuthErrorCode::SessionError => "session-error",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = match s {
            "auth-not-configured" => AuthErrorCode::AuthNotConfigured,
            "invalid-api-key" => AuthErrorCode::InvalidApiKey,
            "project-url-not-configured" => AuthErrorCode::ProjectUrlNotConfigured,
            "invalid-callback-domain" => AuthErrorCode::InvalidCallbackDomain,
            "invalid-callback-target" => AuthErrorCode::InvalidCallbackTarget,
            "github-relay-failed" => AuthErrorCode::GithubRelayFailed,
            "google-relay-failed" => AuthErrorCode::GoogleRelayFailed,
            "magic-link-relay-failed" => AuthErrorCode::MagicLinkRelayFailed,
            "not-collaborator" => AuthErrorCode::NotCollaborator,
            "invalid_token" => AuthErrorCode::InvalidToken,
            "invalid_data" => AuthErrorCode::InvalidData,
            "callback_error" => AuthErrorCode::CallbackError,
            "session-error" => AuthErrorCode::SessionError,
            other => return Err(UnknownErrorCode(other.to_string())),
        };
        Ok(code)
    }
}

/// Error returned when parsing an unrecognized code from a query string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown auth error code: {0}")]
pub struct UnknownErrorCode(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_as_str() {
        let codes = [
            AuthErrorCode::AuthNotConfigured,
            AuthErrorCode::InvalidApiKey,
            AuthErrorCode::ProjectUrlNotConfigured,
            AuthErrorCode::InvalidCallbackDomain,
            AuthErrorCode::InvalidCallbackTarget,
            AuthErrorCode::GithubRelayFailed,
            AuthErrorCode::GoogleRelayFailed,
            AuthErrorCode::MagicLinkRelayFailed,
            AuthErrorCode::NotCollaborator,
            AuthErrorCode::InvalidToken,
            AuthErrorCode::InvalidData,
            AuthErrorCode::CallbackError,
            AuthErrorCode::SessionError,
        ];

        for code in codes {
            assert_eq!(code.as_str().parse::<AuthErrorCode>().unwrap(), code);
        }
    }

    #[test]
    fn snake_case_codes_keep_their_historical_spelling() {
        assert_eq!(AuthErrorCode::InvalidToken.as_str(), "invalid_token");
        assert_eq!(AuthErrorCode::InvalidData.as_str(), "invalid_data");
        assert_eq!(AuthErrorCode::CallbackError.as_str(), "callback_error");
    }

    #[test]
    fn unknown_code_is_an_error() {
        assert!("made-up-code".parse::<AuthErrorCode>().is_err());
    }

    #[test]
    fn serde_uses_the_query_string_names() {
        let json = serde_json::to_string(&AuthErrorCode::InvalidToken).unwrap();
        assert_eq!(json, "\"invalid_token\"");

        let json = serde_json::to_string(&AuthErrorCode::GithubRelayFailed).unwrap();
        assert_eq!(json, "\"github-relay-failed\"");
    }
}
