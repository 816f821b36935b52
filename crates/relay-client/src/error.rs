//! Relay error types.

use auth_core::AuthErrorCode;
use thiserror::Error;

/// Relay error type.
///
/// Transport failures and unrecognized relay responses are collapsed into
/// [`RelayError::Failed`] at this boundary so internal relay details never
/// travel further than the client.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A recognized relay error code, passed through with its HTTP status
    #[error("Relay rejected the request: {code} (HTTP {status})")]
    Known { code: AuthErrorCode, status: u16 },

    /// Unknown error code, malformed payload or transport failure
    #[error("Relay request failed: {0}")]
    Failed(String),

    /// The exchange payload did not match the required schema
    #[error("Exchange payload failed validation: {0}")]
    InvalidData(String),

    /// The relay refused the exchange or refresh token
    #[error("Relay refused the token: HTTP {status}")]
    InvalidToken { status: u16 },
}

/// Result type alias using RelayError.
pub type RelayResult<T> = Result<T, RelayError>;

/// The error codes the relay is allowed to surface verbatim. Anything else
/// collapses to the provider-specific fallback at the caller.
pub(crate) fn passthrough_code(code: &str) -> Option<AuthErrorCode> {
    match code {
        "invalid-api-key" => Some(AuthErrorCode::InvalidApiKey),
        "project-url-not-configured" => Some(AuthErrorCode::ProjectUrlNotConfigured),
        "invalid-callback-domain" => Some(AuthErrorCode::InvalidCallbackDomain),
        "invalid-callback-target" => Some(AuthErrorCode::InvalidCallbackTarget),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_four_known_codes_pass_through() {
        assert_eq!(
            passthrough_code("invalid-api-key"),
            Some(AuthErrorCode::InvalidApiKey)
        );
        assert_eq!(
            passthrough_code("project-url-not-configured"),
            Some(AuthErrorCode::ProjectUrlNotConfigured)
        );
        assert_eq!(
            passthrough_code("invalid-callback-domain"),
            Some(AuthErrorCode::InvalidCallbackDomain)
        );
        assert_eq!(
            passthrough_code("invalid-callback-target"),
            Some(AuthErrorCode::InvalidCallbackTarget)
        );

        // Codes that exist elsewhere in the vocabulary still do not pass
        // through the relay boundary.
        assert_eq!(passthrough_code("not-collaborator"), None);
        assert_eq!(passthrough_code("rate-limited"), None);
    }
}
