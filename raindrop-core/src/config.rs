//! Configuration loading for the Raindrop tool server.
//!
//! The API token and base URL are required. Everything else has a default
//! matching the upstream service's limits.

use crate::error::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default lifetime of a cached response.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Longest accepted cache lifetime (one day).
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// Largest batch the upstream create-many endpoint accepts.
pub const DEFAULT_BULK_CHUNK_SIZE: usize = 100;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

const CONFIG_PATH_ENV: &str = "RAINDROP_CONFIG";
const API_TOKEN_ENV: &str = "RAINDROP_API_TOKEN";
const BASE_URL_ENV: &str = "RAINDROP_BASE_URL";

/// Cache tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub bulk_chunk_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            bulk_chunk_size: DEFAULT_BULK_CHUNK_SIZE,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// On-disk shape. The token is moved into a `SecretString` before the
/// config is handed out.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    api_token: Option<String>,
    base_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,
    #[serde(default)]
    cache: CacheSettings,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Validated configuration.
pub struct RaindropConfig {
    pub api_token: SecretString,
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub cache: CacheSettings,
}

impl fmt::Debug for RaindropConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaindropConfig")
            .field("api_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RaindropConfig {
    /// Build a config with default timeouts and cache settings.
    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_token: SecretString::from(api_token.into()),
            base_url: base_url.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            cache: CacheSettings::default(),
        }
    }

    /// Load from `--config <path>` or `RAINDROP_CONFIG`, then apply
    /// `RAINDROP_API_TOKEN` / `RAINDROP_BASE_URL` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let contents = read_config_file(&path)?;
        let mut raw = parse_raw(&contents)?;
        raw.apply_overrides(
            std::env::var(API_TOKEN_ENV).ok(),
            std::env::var(BASE_URL_ENV).ok(),
        );
        raw.into_config()
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_config_file(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        parse_raw(contents)?.into_config()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_fields(
            self.api_token.expose_secret(),
            &self.base_url,
            self.request_timeout_ms,
            &self.cache,
        )
    }
}

impl RawConfig {
    fn apply_overrides(&mut self, api_token: Option<String>, base_url: Option<String>) {
        if let Some(token) = api_token.filter(|t| !t.trim().is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = Some(url);
        }
    }

    fn into_config(self) -> Result<RaindropConfig, ConfigError> {
        let api_token = self.api_token.ok_or_else(|| ConfigError::MissingRequired {
            field: "api_token".to_string(),
        })?;
        let base_url = self.base_url.ok_or_else(|| ConfigError::MissingRequired {
            field: "base_url".to_string(),
        })?;
        validate_fields(&api_token, &base_url, self.request_timeout_ms, &self.cache)?;

        Ok(RaindropConfig {
            api_token: SecretString::from(api_token),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout_ms: self.request_timeout_ms,
            cache: self.cache,
        })
    }
}

fn validate_fields(
    api_token: &str,
    base_url: &str,
    request_timeout_ms: u64,
    cache: &CacheSettings,
) -> Result<(), ConfigError> {
    if api_token.trim().is_empty() {
        return Err(ConfigError::MissingRequired {
            field: "api_token".to_string(),
        });
    }
    if base_url.trim().is_empty() {
        return Err(ConfigError::MissingRequired {
            field: "base_url".to_string(),
        });
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: "must be an http(s) url".to_string(),
        });
    }
    if request_timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "request_timeout_ms".to_string(),
            value: request_timeout_ms.to_string(),
            reason: "must be > 0".to_string(),
        });
    }
    if cache.ttl_secs == 0 || cache.ttl_secs > MAX_CACHE_TTL_SECS {
        return Err(ConfigError::InvalidValue {
            field: "cache.ttl_secs".to_string(),
            value: cache.ttl_secs.to_string(),
            reason: format!("must be between 1 and {}", MAX_CACHE_TTL_SECS),
        });
    }
    if cache.bulk_chunk_size == 0 || cache.bulk_chunk_size > DEFAULT_BULK_CHUNK_SIZE {
        return Err(ConfigError::InvalidValue {
            field: "cache.bulk_chunk_size".to_string(),
            value: cache.bulk_chunk_size.to_string(),
            reason: format!("must be between 1 and {}", DEFAULT_BULK_CHUNK_SIZE),
        });
    }
    Ok(())
}

fn parse_raw(contents: &str) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })
}

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
