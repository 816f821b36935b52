//! The login flow object shared by the initiation and callback routes.

use admin_config::{AdminConfig, LoginMode};
use github_client::GithubClient;
use relay_client::RelayClient;

/// Login initiator and callback exchanger for one deployment.
///
/// Which of the three login paths applies is decided here once, from
/// configuration, not per request. The relay client exists independently of
/// the mode: a local-OAuth deployment with a relay key still uses the relay
/// for SaaS-side membership validation.
pub struct LoginFlow {
    pub(crate) mode: LoginMode,
    pub(crate) github: Option<GithubClient>,
    pub(crate) relay: Option<RelayClient>,
    pub(crate) repo_owner: String,
    pub(crate) repo_slug: String,
    pub(crate) dashboard_path: String,
    pub(crate) callback_url: String,
    pub(crate) magic_link_callback_url: String,
}

impl LoginFlow {
    /// Build the flow from configuration, constructing clients for whatever
    /// credentials are present.
    pub fn new(config: &AdminConfig) -> Self {
        let mode = config.login_mode();
        let github = match &mode {
            LoginMode::Local {
                client_id,
                client_secret,
                ..
            } => Some(GithubClient::new(client_id.clone(), client_secret.clone())),
            _ => None,
        };
        let relay = config
            .relay_api_key
            .as_ref()
            .map(|key| RelayClient::new(config.relay_url.clone(), key.clone()));

        Self::with_clients(config, github, relay)
    }

    /// Build the flow with pre-constructed clients. Tests use this to point
    /// the clients at mock servers.
    pub fn with_clients(
        config: &AdminConfig,
        github: Option<GithubClient>,
        relay: Option<RelayClient>,
    ) -> Self {
        Self {
            mode: config.login_mode(),
            github,
            relay,
            repo_owner: config.repo_owner.clone(),
            repo_slug: config.repo_slug.clone(),
            dashboard_path: config.dashboard_path(),
            callback_url: config.callback_url(),
            magic_link_callback_url: config.magic_link_callback_url(),
        }
    }

    /// The dashboard path callbacks redirect to.
    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }
}
