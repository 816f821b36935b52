//! Refresh coordination error types.

use thiserror::Error;

/// Refresh coordination error type.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// A previous refresh failed; the latch only clears on a new login
    #[error("Refresh previously failed; sign in again")]
    Latched,

    /// Called again inside the cooldown window
    #[error("Refresh attempted within the cooldown window")]
    Cooldown,

    /// Another context announced a live refresh lock
    #[error("Another context is already refreshing")]
    LockHeld,

    /// Gave up waiting for the in-flight refresh to finish
    #[error("Timed out waiting for the in-flight refresh")]
    Timeout,

    /// The refresh endpoint rejected or failed the request
    #[error("Refresh request failed: {0}")]
    Upstream(String),

    /// The user-info fetch after a successful refresh failed
    #[error("Session fetch failed: {0}")]
    Session(String),
}

/// Result type alias using RefreshError.
pub type RefreshResult<T> = Result<T, RefreshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            RefreshError::Latched.to_string(),
            "Refresh previously failed; sign in again"
        );
        assert_eq!(
            RefreshError::Cooldown.to_string(),
            "Refresh attempted within the cooldown window"
        );
    }
}
