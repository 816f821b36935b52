//! Environment-driven configuration for the admin session service.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default relay service base URL.
pub const DEFAULT_RELAY_URL: &str = "https://relay.outstatic.com";

/// Default public URL of the deployment, used to construct callback URLs.
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Cookie sealing secret used when none is configured. Only acceptable for
/// local development; the server logs a warning when it is in effect.
pub const DEV_COOKIE_SECRET: &str = "outstatic-dev-cookie-secret";

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configured value failed validation
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment configuration, loaded from the environment.
///
/// The login mode is decided by which credentials are present - see
/// [`AdminConfig::login_mode`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Local OAuth app client id, when the deployment talks to the provider
    /// directly.
    pub github_client_id: Option<String>,
    /// Local OAuth app client secret.
    pub github_client_secret: Option<String>,
    /// Explicit callback URL registered with the OAuth app. When unset, the
    /// authorize URL omits `redirect_uri` entirely.
    pub github_callback_url: Option<String>,
    /// Relay service API key, when the deployment delegates exchanges to the
    /// hosted relay.
    pub relay_api_key: Option<String>,
    /// Relay service base URL.
    pub relay_url: String,
    /// Repository owner used for the collaborator authorization check.
    pub repo_owner: String,
    /// Repository name used for the collaborator authorization check.
    pub repo_slug: String,
    /// Path prefix the admin app is mounted under ("" for the site root).
    pub base_path: String,
    /// Public origin of this deployment, used to construct callback and
    /// return URLs.
    pub public_url: String,
    /// Secret the session cookie sealing key is derived from.
    pub cookie_secret: String,
    /// Whether cookies are marked `Secure` (production deployments).
    pub secure_cookies: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            github_client_id: None,
            github_client_secret: None,
            github_callback_url: None,
            relay_api_key: None,
            relay_url: DEFAULT_RELAY_URL.to_string(),
            repo_owner: String::new(),
            repo_slug: String::new(),
            base_path: String::new(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            cookie_secret: DEV_COOKIE_SECRET.to_string(),
            secure_cookies: false,
        }
    }
}

impl AdminConfig {
    /// Create a new config with defaults, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Override configuration from `OST_*` environment variables.
    fn load_from_env(&mut self) {
        if let Some(level) = non_empty_env("OST_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(id) = non_empty_env("OST_GITHUB_ID") {
            self.github_client_id = Some(id);
        }
        if let Some(secret) = non_empty_env("OST_GITHUB_SECRET") {
            self.github_client_secret = Some(secret);
        }
        if let Some(url) = non_empty_env("OST_GITHUB_CALLBACK_URL") {
            self.github_callback_url = Some(url);
        }
        if let Some(key) = non_empty_env("OST_RELAY_API_KEY") {
            self.relay_api_key = Some(key);
        }
        if let Some(url) = non_empty_env("OST_RELAY_URL") {
            self.relay_url = url;
        }
        if let Some(owner) = non_empty_env("OST_REPO_OWNER") {
            self.repo_owner = owner;
        }
        if let Some(slug) = non_empty_env("OST_REPO_SLUG") {
            self.repo_slug = slug;
        }
        if let Some(base) = non_empty_env("OST_BASE_PATH") {
            self.base_path = base;
        }
        if let Some(url) = non_empty_env("OST_PUBLIC_URL") {
            self.public_url = url;
        }
        if let Some(secret) = non_empty_env("OST_COOKIE_SECRET") {
            self.cookie_secret = secret;
        }
        if let Some(value) = non_empty_env("OST_SECURE_COOKIES") {
            self.secure_cookies = matches!(value.as_str(), "1" | "true" | "yes");
        }
    }

    /// Resolve the login mode once, from which credentials are present.
    ///
    /// Order matters: local OAuth credentials win over a relay key, and a
    /// deployment with neither is unconfigured.
    pub fn login_mode(&self) -> LoginMode {
        if let (Some(client_id), Some(client_secret)) = (
            self.github_client_id.as_ref(),
            self.github_client_secret.as_ref(),
        ) {
            return LoginMode::Local {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                callback_url: self.github_callback_url.clone(),
            };
        }
        if let Some(api_key) = self.relay_api_key.as_ref() {
            return LoginMode::Relay {
                api_key: api_key.clone(),
            };
        }
        LoginMode::Unconfigured
    }

    /// Path prefix all auth routes are mounted under.
    pub fn api_base(&self) -> String {
        format!("{}/api/outstatic", self.base_path)
    }

    /// Path of the dashboard the callback redirects to.
    pub fn dashboard_path(&self) -> String {
        format!("{}/outstatic", self.base_path)
    }

    /// Absolute URL of the OAuth/exchange callback route.
    pub fn callback_url(&self) -> String {
        format!("{}{}/callback", self.public_url, self.api_base())
    }

    /// Absolute URL of the magic-link callback route.
    pub fn magic_link_callback_url(&self) -> String {
        format!("{}{}/magic-link-callback", self.public_url, self.api_base())
    }

    /// Origin (scheme + host + port) of the deployment's public URL.
    pub fn public_origin(&self) -> Result<String, ConfigError> {
        let url = Url::parse(&self.public_url).map_err(|e| ConfigError::Invalid {
            name: "public_url",
            reason: e.to_string(),
        })?;
        Ok(url.origin().ascii_serialization())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Which of the three login paths this deployment uses, decided once at
/// startup instead of per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMode {
    /// Local OAuth credentials: authorize URLs are built directly, no relay
    /// round-trip.
    Local {
        client_id: String,
        client_secret: String,
        /// Included as `redirect_uri` only when configured; the provider's
        /// authorize flow has no default fallback.
        callback_url: Option<String>,
    },
    /// All exchanges are delegated to the hosted relay.
    Relay { api_key: String },
    /// Nothing configured; every login attempt fails with
    /// `auth-not-configured`.
    Unconfigured,
}
