//! GitHub client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Asset attached to releases that describes a distributable image.
pub const DEFAULT_ASSET_NAME: &str = "rpi-imager.json";

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// GraphQL endpoint
    pub graphql_url: String,
    /// Authentication token (optional for public data)
    pub token: Option<String>,
    /// User agent sent with every request
    pub user_agent: String,
    /// Name of the release asset holding the descriptor
    pub asset_name: String,
    /// Per-request timeout; the transport default applies when unset
    pub timeout: Option<Duration>,
}

fn graphql_url_for(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = base.strip_suffix("/v3").unwrap_or(base);
    format!("{}/graphql", base)
}

impl Default for GitHubConfig {
    fn default() -> Self {
        let api_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        let graphql_url =
            std::env::var("GITHUB_GRAPHQL_URL").unwrap_or_else(|_| graphql_url_for(&api_url));
        GitHubConfig {
            api_url,
            graphql_url,
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            user_agent: format!("repobot/{}", env!("CARGO_PKG_VERSION")),
            asset_name: DEFAULT_ASSET_NAME.to_string(),
            timeout: None,
        }
    }
}

impl GitHubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API host.
    ///
    /// GraphQL lives at `<api>/graphql`. GitHub Enterprise serves REST under
    /// `/api/v3` but GraphQL under `/api/graphql`, so a trailing `/v3` is
    /// dropped for the GraphQL endpoint.
    pub fn new(api_url: &str) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        GitHubConfig {
            graphql_url: graphql_url_for(&api_url),
            api_url,
            token: None,
            user_agent: format!("repobot/{}", env!("CARGO_PKG_VERSION")),
            asset_name: DEFAULT_ASSET_NAME.to_string(),
            timeout: None,
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the descriptor asset name
    pub fn with_asset_name(mut self, asset_name: &str) -> Self {
        self.asset_name = asset_name.to_string();
        self
    }

    /// Set a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
