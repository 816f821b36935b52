//! HTTP client for the relay service.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::passthrough_code;
use crate::{ExchangePayload, ProjectInfo, RefreshPayload, RelayError, RelayResult};

/// Successful login-initiation responses must carry a string `url`; anything
/// else is treated as a failure, never silently accepted.
#[derive(Debug, Deserialize)]
struct InitiateResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    exchange_token: String,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the relay's auth endpoints.
///
/// Every endpoint except the exchange-token redemption authenticates with
/// the deployment's relay API key.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RelayClient {
    /// Create a new relay client.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the relay for a GitHub authorize URL.
    pub async fn github_exchange(
        &self,
        callback_url: &str,
        return_url: Option<&str>,
    ) -> RelayResult<String> {
        self.initiate(
            "/auth/github-exchange",
            json!({ "callback_url": callback_url, "return_url": return_url }),
        )
        .await
    }

    /// Ask the relay for a Google authorize URL.
    pub async fn google_exchange(
        &self,
        callback_url: &str,
        return_url: Option<&str>,
    ) -> RelayResult<String> {
        self.initiate(
            "/auth/google-exchange",
            json!({ "callback_url": callback_url, "return_url": return_url }),
        )
        .await
    }

    /// Ask the relay to send a magic-link email.
    pub async fn request_magic_link(
        &self,
        callback_url: &str,
        email: &str,
    ) -> RelayResult<String> {
        self.initiate(
            "/auth/request-magic-link",
            json!({ "callback_url": callback_url, "email": email }),
        )
        .await
    }

    async fn initiate(&self, path: &str, body: serde_json::Value) -> RelayResult<String> {
        let url = self.endpoint(path);
        debug!(url = %url, "Initiating login via relay");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_error_response(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;
        match serde_json::from_str::<InitiateResponse>(&text) {
            Ok(parsed) => Ok(parsed.url),
            Err(e) => {
                warn!(error = %e, "Relay initiation response carried no usable url");
                Err(RelayError::Failed(format!("malformed relay response: {e}")))
            }
        }
    }

    /// Redeem a one-time exchange token for a full session payload.
    ///
    /// This is the one relay endpoint that does not authenticate with the
    /// API key: the exchange token is the credential.
    pub async fn exchange_token(
        &self,
        exchange_token: &str,
        callback_url: &str,
    ) -> RelayResult<ExchangePayload> {
        let url = self.endpoint("/auth/exchange-token");
        debug!(url = %url, "Redeeming exchange token");

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "exchange_token": exchange_token,
                "callback_url": callback_url,
            }))
            .send()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Relay refused the exchange token");
            return Err(RelayError::InvalidToken {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;
        serde_json::from_str::<ExchangePayload>(&text).map_err(|e| {
            warn!(error = %e, "Exchange payload failed schema validation");
            RelayError::InvalidData(e.to_string())
        })
    }

    /// Validate a provider-authenticated user against the relay project.
    ///
    /// A valid member gets back an exchange token that is immediately
    /// redeemable for a session.
    pub async fn validate_github_user(
        &self,
        provider_token: &str,
        project_id: Option<&str>,
    ) -> RelayResult<String> {
        let url = self.endpoint("/auth/validate-github-user");
        debug!(url = %url, "Validating provider user with relay");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "token": provider_token, "project_id": project_id }))
            .send()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_error_response(response).await);
        }

        response
            .json::<ValidateResponse>()
            .await
            .map(|v| v.exchange_token)
            .map_err(|e| RelayError::Failed(e.to_string()))
    }

    /// Fetch the relay project record for this deployment.
    pub async fn fetch_project(&self) -> RelayResult<ProjectInfo> {
        let url = self.endpoint("/project");

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.map_error_response(response).await);
        }

        response
            .json::<ProjectInfo>()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))
    }

    /// Redeem a refresh token issued for a relay-established session.
    pub async fn refresh_session(&self, refresh_token: &str) -> RelayResult<RefreshPayload> {
        let url = self.endpoint("/auth/refresh-token");
        debug!(url = %url, "Refreshing relay session");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Relay refused the refresh token");
            return Err(RelayError::InvalidToken {
                status: status.as_u16(),
            });
        }

        response
            .json::<RefreshPayload>()
            .await
            .map_err(|e| RelayError::InvalidData(e.to_string()))
    }

    /// Map a non-2xx relay response to either a recognized pass-through
    /// code or the collapsed failure.
    async fn map_error_response(&self, response: reqwest::Response) -> RelayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        let code = serde_json::from_str::<RelayErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|c| passthrough_code(&c));

        match code {
            Some(code) => {
                debug!(status, code = %code, "Relay returned a recognized error code");
                RelayError::Known { code, status }
            }
            None => {
                warn!(status, "Relay returned an unrecognized error");
                RelayError::Failed(format!("HTTP {status}"))
            }
        }
    }
}
