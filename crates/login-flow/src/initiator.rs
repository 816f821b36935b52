//! Login initiation: produce the URL the browser should be sent to.

use admin_config::LoginMode;
use auth_core::{AuthErrorCode, Provider};
use github_client::DEFAULT_OAUTH_BASE;
use relay_client::RelayError;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::{InitiateError, LoginFlow};

/// OAuth scope requested on the provider authorize URL.
const AUTHORIZE_SCOPE: &str = "repo";

impl LoginFlow {
    /// Produce the URL to send the user's browser to, or a typed error.
    ///
    /// Decision order, first match wins: local OAuth credentials, relay API
    /// key, unconfigured. Google has no local mode and always goes through
    /// the relay. `email` is required for magic-link, `return_url` is
    /// forwarded for the relay-mediated OAuth providers.
    pub async fn initiate(
        &self,
        provider: Provider,
        email: Option<&str>,
        return_url: Option<&str>,
    ) -> Result<String, InitiateError> {
        match provider {
            Provider::Github => self.initiate_github(return_url).await,
            Provider::MagicLink => self.initiate_magic_link(email).await,
            Provider::Google => self.initiate_google(return_url).await,
        }
    }

    async fn initiate_github(&self, return_url: Option<&str>) -> Result<String, InitiateError> {
        match &self.mode {
            LoginMode::Local {
                client_id,
                callback_url,
                ..
            } => {
                let url = authorize_url(client_id, callback_url.as_deref());
                debug!("Built provider authorize URL locally");
                Ok(url)
            }
            LoginMode::Relay { .. } => {
                let Some(relay) = self.relay.as_ref() else {
                    return Err(InitiateError::NotConfigured);
                };
                let url = relay
                    .github_exchange(&self.callback_url, return_url)
                    .await
                    .map_err(|e| map_relay_error(e, AuthErrorCode::GithubRelayFailed))?;
                info!("Obtained GitHub authorize URL from relay");
                Ok(url)
            }
            LoginMode::Unconfigured => Err(InitiateError::NotConfigured),
        }
    }

    async fn initiate_magic_link(&self, email: Option<&str>) -> Result<String, InitiateError> {
        let relay = self.relay.as_ref().ok_or(InitiateError::NotConfigured)?;
        let email = email.ok_or(InitiateError::MissingEmail)?;

        let url = relay
            .request_magic_link(&self.magic_link_callback_url, email)
            .await
            .map_err(|e| map_relay_error(e, AuthErrorCode::MagicLinkRelayFailed))?;
        info!("Requested magic link from relay");
        Ok(url)
    }

    async fn initiate_google(&self, return_url: Option<&str>) -> Result<String, InitiateError> {
        // Google login has no local mode; only the relay can start it.
        let relay = self.relay.as_ref().ok_or(InitiateError::NotConfigured)?;

        let url = relay
            .google_exchange(&self.callback_url, return_url)
            .await
            .map_err(|e| map_relay_error(e, AuthErrorCode::GoogleRelayFailed))?;
        info!("Obtained Google authorize URL from relay");
        Ok(url)
    }
}

/// Build the provider authorize URL for a locally configured OAuth app.
///
/// `redirect_uri` is included only when a callback URL is configured; the
/// provider's authorize flow has no default fallback for it.
fn authorize_url(client_id: &str, callback_url: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("client_id", client_id);
    query.append_pair("scope", AUTHORIZE_SCOPE);
    if let Some(callback_url) = callback_url {
        query.append_pair("redirect_uri", callback_url);
    }
    format!(
        "{DEFAULT_OAUTH_BASE}/login/oauth/authorize?{}",
        query.finish()
    )
}

fn map_relay_error(error: RelayError, fallback: AuthErrorCode) -> InitiateError {
    match error {
        RelayError::Known { code, status } => InitiateError::Relay { code, status },
        _ => InitiateError::RelayFallback { code: fallback },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_config::AdminConfig;

    fn unconfigured_flow() -> LoginFlow {
        LoginFlow::new(&AdminConfig::default())
    }

    fn local_flow(callback_url: Option<&str>) -> LoginFlow {
        LoginFlow::new(&AdminConfig {
            github_client_id: Some("local-id".to_string()),
            github_client_secret: Some("local-secret".to_string()),
            github_callback_url: callback_url.map(String::from),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn unconfigured_github_login_fails_typed() {
        let err = unconfigured_flow()
            .initiate(Provider::Github, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InitiateError::NotConfigured));
    }

    #[tokio::test]
    async fn local_authorize_url_needs_no_network() {
        let url = local_flow(Some("https://site.example.com/api/outstatic/callback"))
            .initiate(Provider::Github, None, None)
            .await
            .unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=local-id"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fsite.example.com%2Fapi%2Foutstatic%2Fcallback"
        ));
    }

    #[tokio::test]
    async fn redirect_uri_is_omitted_when_not_configured() {
        let url = local_flow(None)
            .initiate(Provider::Github, None, None)
            .await
            .unwrap();
        assert!(!url.contains("redirect_uri"));
    }

    #[tokio::test]
    async fn google_has_no_local_mode() {
        // Local credentials alone do not enable Google login.
        let err = local_flow(None)
            .initiate(Provider::Google, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InitiateError::NotConfigured));
    }

    #[tokio::test]
    async fn magic_link_requires_an_email() {
        let flow = LoginFlow::new(&AdminConfig {
            relay_api_key: Some("relay-key".to_string()),
            ..Default::default()
        });
        let err = flow
            .initiate(Provider::MagicLink, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InitiateError::MissingEmail));
    }
}
