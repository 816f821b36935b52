//! Shared application state.

use std::sync::Arc;

use admin_config::{AdminConfig, LoginMode};
use github_client::GithubClient;
use login_flow::LoginFlow;
use relay_client::RelayClient;
use session_cookies::SessionStore;

/// State shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AdminConfig>,
    pub flow: Arc<LoginFlow>,
    pub store: SessionStore,
    /// Provider client for refresh redemption, present in local OAuth mode.
    pub github: Option<GithubClient>,
    /// Relay client for refresh redemption of relay-established sessions.
    pub relay: Option<RelayClient>,
}

impl AppState {
    /// Build the state from configuration.
    pub fn new(config: AdminConfig) -> Self {
        let flow = LoginFlow::new(&config);
        Self::with_flow(config, flow)
    }

    /// Build the state around a pre-constructed flow. Tests use this to
    /// point clients at mock servers.
    pub fn with_flow(config: AdminConfig, flow: LoginFlow) -> Self {
        let github = match config.login_mode() {
            LoginMode::Local {
                client_id,
                client_secret,
                ..
            } => Some(GithubClient::new(client_id, client_secret)),
            _ => None,
        };
        let relay = config
            .relay_api_key
            .as_ref()
            .map(|key| RelayClient::new(config.relay_url.clone(), key.clone()));
        let store = SessionStore::new(&config.cookie_secret, config.secure_cookies);

        Self {
            config: Arc::new(config),
            flow: Arc::new(flow),
            store,
            github,
            relay,
        }
    }

    /// Replace the refresh-redemption clients. Tests use this to point them
    /// at mock servers.
    pub fn with_refresh_clients(
        mut self,
        github: Option<GithubClient>,
        relay: Option<RelayClient>,
    ) -> Self {
        self.github = github;
        self.relay = relay;
        self
    }
}
