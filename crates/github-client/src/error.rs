//! Provider client error types.

use thiserror::Error;

/// Provider client error type.
#[derive(Error, Debug)]
pub enum GithubError {
    /// The token endpoint rejected the exchange
    #[error("Token exchange rejected: {0}")]
    Exchange(String),

    /// Unexpected status from the provider API
    #[error("Provider API error: HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The profile carried no usable email address
    #[error("No verified primary email on the provider account")]
    MissingEmail,

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using GithubError.
pub type GithubResult<T> = Result<T, GithubError>;
