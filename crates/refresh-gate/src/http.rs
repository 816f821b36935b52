//! HTTP-backed session refresher.

use std::future::Future;

use auth_core::StoredSession;
use serde::Deserialize;
use tracing::debug;

use crate::{RefreshError, RefreshResult, SessionRefresher};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    session: StoredSession,
}

/// Drives the deployment's own refresh and user-info endpoints.
///
/// The client keeps a cookie store so the refresh and session cookies ride
/// along the way a browser would send them.
#[derive(Clone)]
pub struct HttpSessionRefresher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionRefresher {
    /// Create a refresher for the auth routes mounted at `base_url`
    /// (e.g. `https://site.example.com/api/outstatic`).
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Create a refresher sharing an existing client (and its cookie store).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl SessionRefresher for HttpSessionRefresher {
    fn refresh(&self) -> impl Future<Output = RefreshResult<()>> + Send {
        let http = self.http.clone();
        let url = format!("{}/refresh", self.base_url);

        async move {
            debug!(url = %url, "Posting refresh");
            let response = http
                .post(&url)
                .send()
                .await
                .map_err(|e| RefreshError::Upstream(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RefreshError::Upstream(format!("HTTP {status}")));
            }

            let body: RefreshResponse = response
                .json()
                .await
                .map_err(|e| RefreshError::Upstream(e.to_string()))?;
            if !body.success {
                return Err(RefreshError::Upstream(
                    "refresh endpoint reported failure".to_string(),
                ));
            }
            Ok(())
        }
    }

    fn fetch_session(&self) -> impl Future<Output = RefreshResult<StoredSession>> + Send {
        let http = self.http.clone();
        let url = format!("{}/user", self.base_url);

        async move {
            debug!(url = %url, "Fetching session");
            let response = http
                .get(&url)
                .send()
                .await
                .map_err(|e| RefreshError::Session(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RefreshError::Session(format!("HTTP {status}")));
            }

            response
                .json::<UserResponse>()
                .await
                .map(|body| body.session)
                .map_err(|e| RefreshError::Session(e.to_string()))
        }
    }
}
