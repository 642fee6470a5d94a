//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The access token comes from INVENTORY_ACCESS_TOKEN or access_token_file and
//! is never read from the TOML directly.

use std::path::{Path, PathBuf};

use api_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use common::Secret;
use identity::IdentityConfig;
use serde::Deserialize;

pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
pub const ENV_BASE_URL: &str = "API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";
pub const ENV_ACCESS_TOKEN: &str = "INVENTORY_ACCESS_TOKEN";

const DEFAULT_CONFIG_FILE: &str = "inventory-cli.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub identity: IdentityConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// File holding a pre-issued access token (alternative to INVENTORY_ACCESS_TOKEN)
    pub access_token_file: Option<PathBuf>,
    #[serde(skip)]
    pub access_token: Option<Secret<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            access_token_file: None,
            access_token: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents, |name| std::env::var(name).ok())
    }

    /// Defaults overlaid with the environment, for runs without a config file.
    pub fn from_env() -> common::Result<Self> {
        Self::default().finish(|name| std::env::var(name).ok())
    }

    pub fn from_toml<F>(contents: &str, lookup: F) -> common::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config: Config = toml::from_str(contents)?;
        config.finish(lookup)
    }

    /// Apply environment overrides, validate, and resolve the access token.
    ///
    /// Access token resolution order:
    /// 1. INVENTORY_ACCESS_TOKEN env var
    /// 2. access_token_file path from config
    fn finish<F>(mut self, lookup: F) -> common::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = get(ENV_BASE_URL) {
            self.api.base_url = base_url;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.api.timeout_secs = raw.trim().parse().map_err(|_| {
                common::Error::env(ENV_TIMEOUT_SECS, format!("expected seconds, got {raw:?}"))
            })?;
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        self.identity = self.identity.with_env_overrides(&lookup)?;

        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.api.access_token = Some(Secret::new(token.trim().to_owned()));
        } else if let Some(ref token_file) = self.api.access_token_file {
            let token = std::fs::read_to_string(token_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read access_token_file {}: {e}",
                    token_file.display()
                ))
            })?;
            let token = Secret::new(token.trim().to_owned());
            if !token.is_blank() {
                self.api.access_token = Some(token);
            }
        }

        Ok(self)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}
