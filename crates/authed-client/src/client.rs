//! The refresh-then-retry-once request wrapper.

use std::sync::{Arc, RwLock};

use refresh_gate::{RefreshGate, SessionRefresher};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use crate::CredentialScheme;

/// Authenticated client error type.
#[derive(Error, Debug)]
pub enum AuthedClientError {
    /// The credential cannot be carried in a header
    #[error("Invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared, swappable credential.
///
/// The refresh gate's session callback writes the new access token here so
/// every holder of the cell sees it before any retry goes out.
#[derive(Clone, Default)]
pub struct CredentialCell(Arc<RwLock<String>>);

impl CredentialCell {
    /// Create a cell holding `credential`.
    pub fn new(credential: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(credential.into())))
    }

    /// Current credential.
    pub fn get(&self) -> String {
        self.0.read().unwrap().clone()
    }

    /// Replace the credential.
    pub fn set(&self, credential: impl Into<String>) {
        *self.0.write().unwrap() = credential.into();
    }
}

/// Wraps outbound authenticated requests.
///
/// On an authorization failure (401/403) on the first attempt only, the
/// client asks the refresh gate for a new session, swaps its credential,
/// and retries the original request exactly once. Any second failure -
/// including a failure inside the refresh itself - surfaces the original
/// authorization failure unmodified.
pub struct AuthedClient<R: SessionRefresher> {
    http: reqwest::Client,
    gate: Arc<RefreshGate<R>>,
    scheme: CredentialScheme,
    credential: CredentialCell,
}

impl<R: SessionRefresher> AuthedClient<R> {
    /// Create a client around a gate and an initial credential.
    pub fn new(
        gate: Arc<RefreshGate<R>>,
        scheme: CredentialScheme,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            gate,
            scheme,
            credential: CredentialCell::new(credential),
        }
    }

    /// The shared credential cell, for wiring into the gate's session
    /// callback.
    pub fn credential_cell(&self) -> CredentialCell {
        self.credential.clone()
    }

    /// Build a request against this client's inner `reqwest::Client`.
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http.request(method, url)
    }

    /// Send an authenticated request.
    pub async fn send(&self, request: Request) -> Result<Response, AuthedClientError> {
        // A retry is only possible for requests whose body can be cloned;
        // streaming bodies go out once and keep their failure.
        let retry = request.try_clone();

        let mut first = request;
        self.apply_credential(&mut first)?;
        let response = self.http.execute(first).await?;

        if !is_auth_failure(response.status()) {
            return Ok(response);
        }
        let Some(mut retry) = retry else {
            return Ok(response);
        };

        debug!(status = %response.status(), "Authorization failed; refreshing session");
        match self.gate.refresh().await {
            Ok(session) => {
                self.credential.set(session.access_token);
            }
            Err(error) => {
                // The caller gets the original authorization failure; the
                // latched gate handles everything after that.
                warn!(error = %error, "Refresh failed; propagating the original failure");
                return Ok(response);
            }
        }

        self.apply_credential(&mut retry)?;
        let retried = self.http.execute(retry).await?;
        debug!(status = %retried.status(), "Retried request after refresh");
        Ok(retried)
    }

    fn apply_credential(&self, request: &mut Request) -> Result<(), AuthedClientError> {
        let value = self.scheme.header_value(&self.credential.get());
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&value)?);
        Ok(())
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
