//! Client configuration loaded from environment variables.
//!
//! All settings default to the public network so the client works with
//! zero configuration against a local wallet node.

use std::time::Duration;

use namechanger_shared::constants::{
    CLIENT_ORIGIN, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_NAME_INDEX_URL, DEFAULT_PEER_URL,
    DEFAULT_WALLET_RPC_URL, NAME_INDEX_ATTEMPTS,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Peer node for profile reads and deployments.
    /// Env: `PEER_URL`
    pub peer_url: String,

    /// Name ownership index (GraphQL).
    /// Env: `NAME_INDEX_URL`
    pub name_index_url: String,

    /// Wallet JSON-RPC endpoint.
    /// Env: `WALLET_RPC_URL`
    pub wallet_rpc_url: String,

    /// Name index attempts before the lookup is reported as exhausted.
    /// Env: `NAME_INDEX_ATTEMPTS`
    /// Default: `5`
    pub index_attempts: usize,

    /// Pause between name index attempts.
    /// Env: `NAME_INDEX_RETRY_DELAY_MS`
    /// Default: `0` (retry immediately)
    pub index_retry_delay: Duration,

    /// Timeout for index and peer requests. Wallet signing has none.
    /// Env: `HTTP_TIMEOUT_SECS`
    pub http_timeout: Duration,

    /// Origin tag sent as the user agent.
    /// Env: `CLIENT_ORIGIN`
    pub origin: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            peer_url: DEFAULT_PEER_URL.to_string(),
            name_index_url: DEFAULT_NAME_INDEX_URL.to_string(),
            wallet_rpc_url: DEFAULT_WALLET_RPC_URL.to_string(),
            index_attempts: NAME_INDEX_ATTEMPTS,
            index_retry_delay: Duration::ZERO,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            origin: CLIENT_ORIGIN.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PEER_URL") {
            config.peer_url = trim_url(&url);
        }

        if let Some(url) = lookup("NAME_INDEX_URL") {
            config.name_index_url = url.trim().to_string();
        }

        if let Some(url) = lookup("WALLET_RPC_URL") {
            config.wallet_rpc_url = url.trim().to_string();
        }

        if let Some(val) = lookup("NAME_INDEX_ATTEMPTS") {
            match val.parse::<usize>() {
                Ok(n) if n >= 1 => config.index_attempts = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid NAME_INDEX_ATTEMPTS, using default");
                }
            }
        }

        if let Some(val) = lookup("NAME_INDEX_RETRY_DELAY_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.index_retry_delay = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid NAME_INDEX_RETRY_DELAY_MS, using default");
                }
            }
        }

        if let Some(val) = lookup("HTTP_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %val, "Invalid HTTP_TIMEOUT_SECS, using default");
                }
            }
        }

        if let Some(origin) = lookup("CLIENT_ORIGIN") {
            if !origin.is_empty() {
                config.origin = origin;
            }
        }

        config
    }

    pub fn with_peer_url(mut self, url: &str) -> Self {
        self.peer_url = trim_url(url);
        self
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
