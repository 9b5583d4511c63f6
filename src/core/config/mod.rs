//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables
//! 4. CLI flags (not handled here)
//!
//! # Environment
//!
//! | Variable | Meaning |
//! |---|---|
//! | `GITHUB_TOKEN` | Access token (environment only) |
//! | `GITHUB_OWNER` | Repository owner |
//! | `GITHUB_REPO` | Repository name |
//! | `GITHUB_BRANCH` | Content branch (default `main`) |
//! | `GITHUB_API_BASE` | API base URL |
//! | `TRAILHEAD_BIND` | Server listen address |
//! | `TRAILHEAD_BRANCH_TTL_SECS` | Status endpoint branch cache TTL |
//!
//! # Example
//!
//! ```no_run
//! use trailhead::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let store = config.store_settings().unwrap();
//! println!("{}/{}@{}", store.owner, store.repo, store.branch);
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Default content branch.
pub const DEFAULT_BRANCH: &str = "main";

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default server listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default branch-ref cache TTL.
pub const DEFAULT_BRANCH_TTL_SECS: u64 = 60;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing required setting {0}")]
    Missing(&'static str),
}

/// Location and credentials of the content store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
    pub token: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

/// Values given on the command line. `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub bind: Option<String>,
}

/// Resolved configuration from all sources.
#[derive(Clone, Default)]
pub struct Config {
    owner: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
    api_base: Option<String>,
    token: Option<String>,
    bind: Option<String>,
    branch_ttl_secs: Option<u64>,
    /// Path to the config file (if loaded)
    file_path: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .field("has_token", &self.token.is_some())
            .field("bind", &self.bind)
            .field("branch_ttl_secs", &self.branch_ttl_secs)
            .field("file_path", &self.file_path)
            .finish()
    }
}

impl Config {
    /// Load configuration from the default file location and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// any value is invalid. A missing config file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let file = match Self::find_file(&env) {
            Some(path) => Some((Self::read_file(&path)?, path)),
            None => None,
        };
        Self::from_sources(file, &env)
    }

    /// Load configuration from an explicit file plus the process environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let file = Self::read_file(path)?;
        Self::from_sources(Some((file, path.to_path_buf())), &env)
    }

    /// Merge a parsed config file with environment values.
    pub fn from_sources(
        file: Option<(FileConfig, PathBuf)>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some((file, path)) = file {
            file.validate()?;
            if let Some(store) = file.store {
                config.owner = store.owner;
                config.repo = store.repo;
                config.branch = store.branch;
                config.api_base = store.api_base;
            }
            config.bind = file.server.and_then(|s| s.bind);
            config.branch_ttl_secs = file.cache.and_then(|c| c.branch_ttl_secs);
            config.file_path = Some(path);
        }

        let var = |key: &str| {
            env.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = var("GITHUB_OWNER") {
            config.owner = Some(v);
        }
        if let Some(v) = var("GITHUB_REPO") {
            config.repo = Some(v);
        }
        if let Some(v) = var("GITHUB_BRANCH") {
            config.branch = Some(v);
        }
        if let Some(v) = var("GITHUB_API_BASE") {
            config.api_base = Some(v);
        }
        if let Some(v) = var("GITHUB_TOKEN") {
            config.token = Some(v);
        }
        if let Some(v) = var("TRAILHEAD_BIND") {
            v.parse::<std::net::SocketAddr>().map_err(|_| {
                ConfigError::InvalidValue(format!("TRAILHEAD_BIND '{}' is not a socket address", v))
            })?;
            config.bind = Some(v);
        }
        if let Some(v) = var("TRAILHEAD_BRANCH_TTL_SECS") {
            let secs = v.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "TRAILHEAD_BRANCH_TTL_SECS '{}' is not a number of seconds",
                    v
                ))
            })?;
            config.branch_ttl_secs = Some(secs);
        }

        Ok(config)
    }

    /// Locate the config file, if any.
    fn find_file(env: &HashMap<String, String>) -> Option<PathBuf> {
        // 1. Check $TRAILHEAD_CONFIG
        if let Some(path) = env.get("TRAILHEAD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/trailhead/config.toml
        if let Some(xdg_home) = env.get("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("trailhead/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.trailhead/config.toml
        dirs::home_dir()
            .map(|home| home.join(".trailhead/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a config file.
    pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply command-line overrides on top of file and environment values.
    pub fn apply(&mut self, overrides: Overrides) -> Result<(), ConfigError> {
        if let Some(bind) = &overrides.bind {
            bind.parse::<std::net::SocketAddr>().map_err(|_| {
                ConfigError::InvalidValue(format!("--bind '{}' is not a socket address", bind))
            })?;
        }

        let Overrides {
            owner,
            repo,
            branch,
            bind,
        } = overrides;
        self.owner = owner.or(self.owner.take());
        self.repo = repo.or(self.repo.take());
        self.branch = branch.or(self.branch.take());
        self.bind = bind.or(self.bind.take());
        Ok(())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Content store settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if owner, repo, or token is unset.
    pub fn store_settings(&self) -> Result<StoreSettings, ConfigError> {
        Ok(StoreSettings {
            owner: self.owner.clone().ok_or(ConfigError::Missing("GITHUB_OWNER"))?,
            repo: self.repo.clone().ok_or(ConfigError::Missing("GITHUB_REPO"))?,
            branch: self.branch().to_string(),
            api_base: self.api_base().to_string(),
            token: self.token.clone().ok_or(ConfigError::Missing("GITHUB_TOKEN"))?,
        })
    }

    /// Content branch. Defaults to `main`.
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// API base URL. Defaults to the public GitHub API.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Server listen address. Defaults to `127.0.0.1:3000`.
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Branch-ref cache TTL for the status endpoint.
    pub fn branch_ttl(&self) -> Duration {
        Duration::from_secs(self.branch_ttl_secs.unwrap_or(DEFAULT_BRANCH_TTL_SECS))
    }

    /// Path of the config file that was loaded, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_sources() {
        let config = Config::from_sources(None, &HashMap::new()).unwrap();
        assert_eq!(config.branch(), "main");
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config.bind(), DEFAULT_BIND);
        assert_eq!(config.branch_ttl(), Duration::from_secs(60));
        assert!(config.file_path().is_none());
    }

    #[test]
    fn store_settings_require_owner_repo_token() {
        let config = Config::from_sources(None, &env(&[("GITHUB_OWNER", "acme")])).unwrap();
        assert!(matches!(
            config.store_settings(),
            Err(ConfigError::Missing("GITHUB_REPO"))
        ));

        let config = Config::from_sources(
            None,
            &env(&[("GITHUB_OWNER", "acme"), ("GITHUB_REPO", "content")]),
        )
        .unwrap();
        assert!(matches!(
            config.store_settings(),
            Err(ConfigError::Missing("GITHUB_TOKEN"))
        ));
    }

    #[test]
    fn env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [store]
            owner = "file-owner"
            repo = "file-repo"
            branch = "file-branch"

            [cache]
            branch_ttl_secs = 5
            "#,
        )
        .unwrap();

        let file = Config::read_file(&path).unwrap();
        let config = Config::from_sources(
            Some((file, path.clone())),
            &env(&[
                ("GITHUB_BRANCH", "env-branch"),
                ("GITHUB_TOKEN", "ghp_secret"),
            ]),
        )
        .unwrap();

        let store = config.store_settings().unwrap();
        assert_eq!(store.owner, "file-owner");
        assert_eq!(store.repo, "file-repo");
        assert_eq!(store.branch, "env-branch");
        assert_eq!(config.branch_ttl(), Duration::from_secs(5));
        assert_eq!(config.file_path(), Some(path.as_path()));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = Config::from_sources(None, &env(&[("GITHUB_BRANCH", "  ")])).unwrap();
        assert_eq!(config.branch(), "main");
    }

    #[test]
    fn invalid_ttl_is_rejected() {
        let result = Config::from_sources(None, &env(&[("TRAILHEAD_BRANCH_TTL_SECS", "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let result = Config::from_sources(None, &env(&[("TRAILHEAD_BIND", "nope")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn overrides_win_over_env() {
        let mut config = Config::from_sources(
            None,
            &env(&[("GITHUB_OWNER", "env-owner"), ("GITHUB_BRANCH", "env-branch")]),
        )
        .unwrap();

        config
            .apply(Overrides {
                owner: Some("cli-owner".into()),
                bind: Some("0.0.0.0:8080".into()),
                ..Overrides::default()
            })
            .unwrap();

        assert_eq!(config.owner.as_deref(), Some("cli-owner"));
        assert_eq!(config.branch(), "env-branch");
        assert_eq!(config.bind(), "0.0.0.0:8080");
    }

    #[test]
    fn override_bind_is_validated() {
        let mut config = Config::default();
        let result = config.apply(Overrides {
            bind: Some("localhost".into()),
            ..Overrides::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
        assert_eq!(config.bind(), DEFAULT_BIND);
    }

    #[test]
    fn parse_error_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[store\nowner=").unwrap();

        match Config::read_file(&path) {
            Err(ConfigError::ParseError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn debug_redacts_token() {
        let config = Config::from_sources(
            None,
            &env(&[
                ("GITHUB_OWNER", "acme"),
                ("GITHUB_REPO", "content"),
                ("GITHUB_TOKEN", "ghp_topsecret"),
            ]),
        )
        .unwrap();

        assert!(!format!("{:?}", config).contains("ghp_topsecret"));
        let store = config.store_settings().unwrap();
        assert!(!format!("{:?}", store).contains("ghp_topsecret"));
    }
}
