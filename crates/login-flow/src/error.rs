//! Login initiation error types.

use auth_core::AuthErrorCode;
use thiserror::Error;

/// Error returned by login initiation.
///
/// Initiation failures surface as structured JSON (or, on the GET variant,
/// as an error code appended to the caller's return URL), so every variant
/// knows its HTTP status and, where one exists, its wire code.
#[derive(Error, Debug)]
pub enum InitiateError {
    /// Neither local credentials nor a relay key are configured
    #[error("authentication is not configured")]
    NotConfigured,

    /// Magic-link initiation was requested without an email address
    #[error("email is required for magic-link login")]
    MissingEmail,

    /// The relay rejected the request with a recognized code
    #[error("relay rejected the login request: {code}")]
    Relay { code: AuthErrorCode, status: u16 },

    /// Everything else the relay did wrong, collapsed per provider
    #[error("login initiation failed: {code}")]
    RelayFallback { code: AuthErrorCode },
}

impl InitiateError {
    /// Wire code carried in the JSON body or redirect query string.
    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            InitiateError::NotConfigured => Some(AuthErrorCode::AuthNotConfigured),
            InitiateError::MissingEmail => None,
            InitiateError::Relay { code, .. } => Some(*code),
            InitiateError::RelayFallback { code } => Some(*code),
        }
    }

    /// HTTP status for the JSON response.
    pub fn status(&self) -> u16 {
        match self {
            InitiateError::NotConfigured => 400,
            InitiateError::MissingEmail => 400,
            InitiateError::Relay { status, .. } => *status,
            InitiateError::RelayFallback { .. } => 500,
        }
    }
}
