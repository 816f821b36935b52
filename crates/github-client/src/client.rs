//! HTTP client for the git-hosting provider's OAuth and REST APIs.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{GithubError, GithubResult};

/// Default OAuth host (authorize + token endpoints).
pub const DEFAULT_OAUTH_BASE: &str = "https://github.com";

/// Default REST API host.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "outstatic-admin";

/// Tokens returned by the provider's token endpoint.
///
/// Classic OAuth apps issue a bare non-expiring token; apps with token
/// expiration enabled also return a rotating refresh token and lifetimes.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, when the provider reports one.
    pub expires_in: Option<i64>,
    /// Refresh token lifetime in seconds, when the provider reports one.
    pub refresh_token_expires_in: Option<i64>,
}

/// Provider user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// The token endpoint answers 200 for both success and failure; the error
/// field decides which one we got.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token_expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the provider's OAuth token endpoint and REST API.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    oauth_base: String,
    api_base: String,
}

impl GithubClient {
    /// Create a client for the public provider endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at different hosts. Used by tests.
    pub fn with_endpoints(
        mut self,
        oauth_base: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.oauth_base = oauth_base.into();
        self.api_base = api_base.into();
        self
    }

    /// Exchange an authorization code for a token set.
    ///
    /// `redirect_uri` must match the value sent on the authorize URL, so it
    /// is forwarded only when one was configured there.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> GithubResult<TokenSet> {
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
        ];
        if let Some(redirect_uri) = redirect_uri {
            params.push(("redirect_uri", redirect_uri));
        }

        self.token_endpoint_request(&params).await
    }

    /// Redeem a refresh token for a fresh token set.
    pub async fn refresh(&self, refresh_token: &str) -> GithubResult<TokenSet> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        self.token_endpoint_request(&params).await
    }

    async fn token_endpoint_request(&self, params: &[(&str, &str)]) -> GithubResult<TokenSet> {
        let url = format!("{}/login/oauth/access_token", self.oauth_base);
        debug!(url = %url, "Calling provider token endpoint");

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            warn!(status, "Provider token endpoint returned an error status");
            return Err(GithubError::Api { status, detail });
        }

        let body: TokenEndpointResponse = response.json().await?;
        if let Some(error) = body.error {
            let detail = body.error_description.unwrap_or_default();
            warn!(error = %error, "Provider token endpoint rejected the exchange");
            return Err(GithubError::Exchange(format!("{error}: {detail}")));
        }

        let access_token = body
            .access_token
            .ok_or_else(|| GithubError::Exchange("response carried no access token".into()))?;

        Ok(TokenSet {
            access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
            refresh_token_expires_in: body.refresh_token_expires_in,
        })
    }

    /// Fetch the authenticated user's profile.
    ///
    /// When the profile has no public email, falls back to the primary
    /// verified address from the emails endpoint.
    pub async fn fetch_user(&self, access_token: &str) -> GithubResult<GithubUser> {
        let url = format!("{}/user", self.api_base);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {access_token}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(GithubError::Api { status, detail });
        }

        let mut user: GithubUser = response.json().await?;
        if user.email.is_none() {
            user.email = Some(self.fetch_primary_email(access_token).await?);
        }

        debug!(login = %user.login, "Fetched provider user profile");
        Ok(user)
    }

    async fn fetch_primary_email(&self, access_token: &str) -> GithubResult<String> {
        let url = format!("{}/user/emails", self.api_base);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {access_token}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(GithubError::Api { status, detail });
        }

        let emails: Vec<GithubEmail> = response.json().await?;
        emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email)
            .ok_or(GithubError::MissingEmail)
    }

    /// Check whether `username` has write access to the configured
    /// repository.
    ///
    /// The provider answers 204 for collaborators and 404 for everyone else;
    /// both are definitive answers, not errors.
    pub async fn is_collaborator(
        &self,
        access_token: &str,
        owner: &str,
        repo: &str,
        username: &str,
    ) -> GithubResult<bool> {
        let url = format!(
            "{}/repos/{owner}/{repo}/collaborators/{username}",
            self.api_base
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {access_token}"))
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        match response.status().as_u16() {
            204 => Ok(true),
            404 => Ok(false),
            status => {
                let detail = response.text().await.unwrap_or_default();
                warn!(status, owner, repo, "Collaborator check failed");
                Err(GithubError::Api { status, detail })
            }
        }
    }
}
