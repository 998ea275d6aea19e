//! Tracing Subscriber Initialization
//!
//! Structured logs go to stdout, plain text by default or one JSON object
//! per line when `RAINDROP_LOG_FORMAT=json`. `RUST_LOG` takes precedence
//! over the configured default directive.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FORMAT_ENV: &str = "RAINDROP_LOG_FORMAT";
const LOG_DIRECTIVE_ENV: &str = "RAINDROP_LOG";

/// Used when neither `RUST_LOG` nor `RAINDROP_LOG` is set.
pub const DEFAULT_DIRECTIVE: &str = "raindrop_tools=info,raindrop_cache=info,warn";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("Tracing subscriber already initialized: {reason}")]
    AlreadyInitialized { reason: String },
}

/// Logging configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive applied when `RUST_LOG` is unset.
    pub default_directive: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_directive: std::env::var(LOG_DIRECTIVE_ENV)
                .ok()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string()),
            json: std::env::var(LOG_FORMAT_ENV)
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

impl TelemetryConfig {
    fn filter(&self) -> Result<EnvFilter, TelemetryError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive).map_err(|e| {
                TelemetryError::InvalidDirective {
                    directive: self.default_directive.clone(),
                    reason: e.to_string(),
                }
            }),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup. A second call returns
/// [`TelemetryError::AlreadyInitialized`] and leaves the first subscriber in
/// place.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = config.filter()?;

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized {
            reason: e.to_string(),
        })?;

    tracing::info!(json = config.json, "Telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    // Both env vars are touched in one test so parallel tests never race on them.
    #[test]
    fn test_telemetry_config_from_env() {
        let _format = EnvVarGuard::set(LOG_FORMAT_ENV, None);
        let _directive = EnvVarGuard::set(LOG_DIRECTIVE_ENV, None);
        let config = TelemetryConfig::default();
        assert_eq!(config.default_directive, DEFAULT_DIRECTIVE);
        assert!(!config.json);

        let _format = EnvVarGuard::set(LOG_FORMAT_ENV, Some("JSON"));
        let _directive = EnvVarGuard::set(LOG_DIRECTIVE_ENV, Some("debug"));
        let config = TelemetryConfig::default();
        assert_eq!(config.default_directive, "debug");
        assert!(config.json);
    }

    #[test]
    fn test_invalid_directive_is_reported() {
        let _rust_log = EnvVarGuard::set("RUST_LOG", None);
        let config = TelemetryConfig {
            default_directive: "raindrop_tools=loud".to_string(),
            json: false,
        };
        let err = config.filter().unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidDirective { .. }));
    }
}
