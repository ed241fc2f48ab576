//! Configuration loading.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.satchel/config.toml` (user; optional)
//! 3. built-in defaults
//!
//! Every section and field is optional.
//!
//! ```toml
//! [api]
//! base_url = "https://lms.example.org/api"
//! timeout_secs = 30
//!
//! [cache]
//! max_entries = 1000
//! ttl_secs = 300
//!
//! [credentials]
//! path = "/home/me/.config/satchel/credentials.json"
//!
//! [preload]
//! max_pending = 256
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::auth::FileCredentialStore;
use crate::auth::credential::default_credentials_path;
use crate::cache::{CacheConfig, DEFAULT_TTL};
use crate::gateway::{FetchGateway, Satchel};
use crate::preload::{DEFAULT_MAX_PENDING, PreloadConfig};
use crate::{Result, SatchelError};

/// Client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub preload: PreloadSection,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Base URL. Unset: `$SATCHEL_API_URL`, then the built-in default.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Transport timeout in seconds (default: 30).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Maximum cached entries (default: 1000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Time-to-live in seconds (default: 300).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> u64 {
    CacheConfig::default().max_entries
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

/// Credential storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    /// Credentials file (default: `~/.config/satchel/credentials.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Preload queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadSection {
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

impl Default for PreloadSection {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
        }
    }
}

fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path that does not exist is an error; a missing user
    /// config falls back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    /// Parse a specific config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SatchelError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::parse(&content).map_err(|e| match e {
            SatchelError::Configuration(msg) => {
                SatchelError::Configuration(format!("{path:?}: {msg}"))
            }
            other => other,
        })
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SatchelError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(SatchelError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        let user_config = dirs::home_dir().map(|home| home.join(".satchel").join("config.toml"));
        Ok(user_config.filter(|path| path.exists()))
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.cache.max_entries)
            .ttl(Duration::from_secs(self.cache.ttl_secs))
    }

    pub fn preload_config(&self) -> PreloadConfig {
        PreloadConfig::new().max_pending(self.preload.max_pending)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials
            .path
            .clone()
            .unwrap_or_else(default_credentials_path)
    }

    /// Build a gateway with file-backed credentials from this configuration.
    pub fn build_gateway(&self) -> Result<FetchGateway> {
        let mut builder = Satchel::builder()
            .cache(self.cache_config())
            .credential_store(Arc::new(FileCredentialStore::new(self.credentials_path())));
        if let Some(url) = &self.api.base_url {
            builder = builder.base_url(url);
        }
        if let Some(secs) = self.api.timeout_secs {
            builder = builder.timeout(secs);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.api.base_url.is_none());
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.max_entries, 1_000);
        assert_eq!(config.preload.max_pending, DEFAULT_MAX_PENDING);
        assert!(config.credentials_path().ends_with("credentials.json"));
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://lms.example.org/api"
            timeout_secs = 5

            [cache]
            ttl_secs = 60

            [preload]
            max_pending = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("https://lms.example.org/api"));
        assert_eq!(config.api.timeout_secs, Some(5));
        assert_eq!(config.cache_config().ttl, Duration::from_secs(60));
        assert_eq!(config.cache_config().max_entries, 1_000);
        assert_eq!(config.preload_config().max_pending, 8);
    }

    #[test]
    fn invalid_toml_is_configuration_error() {
        let err = Config::parse("[api\nbase_url = ").unwrap_err();
        assert!(matches!(err, SatchelError::Configuration(_)));
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/satchel.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
