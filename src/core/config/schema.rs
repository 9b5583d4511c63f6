//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$TRAILHEAD_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/trailhead/config.toml`
//! 3. `~/.trailhead/config.toml`
//!
//! The access token is not part of the file schema; it is only
//! ever read from the environment.
//!
//! # Validation
//!
//! Unknown keys are rejected. Values are validated after parsing.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration file contents.
///
/// # Example
///
/// ```toml
/// [store]
/// owner = "scavenger-co"
/// repo = "hunt-content"
/// branch = "main"
///
/// [server]
/// bind = "0.0.0.0:8080"
///
/// [cache]
/// branch_ttl_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Content store location
    pub store: Option<StoreSection>,

    /// HTTP server settings
    pub server: Option<ServerSection>,

    /// Branch-ref cache settings
    pub cache: Option<CacheSection>,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    /// Repository owner (user or organization)
    pub owner: Option<String>,
    /// Repository name
    pub repo: Option<String>,
    /// Branch holding the content
    pub branch: Option<String>,
    /// API base URL (GitHub Enterprise)
    pub api_base: Option<String>,
}

/// `[server]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Socket address to listen on
    pub bind: Option<String>,
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// How long a resolved branch head may be reused by the status endpoint
    pub branch_ttl_secs: Option<u64>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            for (key, value) in [
                ("store.owner", &store.owner),
                ("store.repo", &store.repo),
                ("store.branch", &store.branch),
            ] {
                if let Some(v) = value {
                    if v.trim().is_empty() {
                        return Err(ConfigError::InvalidValue(format!(
                            "{} cannot be empty",
                            key
                        )));
                    }
                }
            }

            if let Some(api_base) = &store.api_base {
                if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                    return Err(ConfigError::InvalidValue(format!(
                        "store.api_base '{}' must be an http(s) URL",
                        api_base
                    )));
                }
            }
        }

        if let Some(bind) = self.server.as_ref().and_then(|s| s.bind.as_deref()) {
            if bind.parse::<std::net::SocketAddr>().is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "server.bind '{}' is not a socket address",
                    bind
                )));
            }
        }

        Ok(())
    }
}
