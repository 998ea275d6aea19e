//! Error types for Raindrop operations

use thiserror::Error;

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// An empty credential cannot scope a cache partition.
    #[error("Invalid credential: a non-empty credential is required to derive a cache key")]
    InvalidCredential,
}

/// Failures talking to the upstream bookmark service.
///
/// These cover thrown failures only. A well-formed response carrying
/// `result: false` is returned as a value, not as an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Request to {endpoint} failed with status {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("Upstream rejected {operation}")]
    Rejected { operation: String },
}

/// Validation errors for tool arguments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value for {field} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration file path (use --config or RAINDROP_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },
}

/// Master error type for all Raindrop errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RaindropError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RaindropError {
    /// Returns true if this error is a cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for Raindrop operations.
pub type RaindropResult<T> = Result<T, RaindropError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display_invalid_credential() {
        let msg = format!("{}", CacheError::InvalidCredential);
        assert!(msg.contains("Invalid credential"));
    }

    #[test]
    fn test_upstream_error_display_status() {
        let err = UpstreamError::Status {
            endpoint: "/collections".to_string(),
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/collections"));
        assert!(msg.contains("429"));
        assert!(msg.contains("Too Many Requests"));
    }

    #[test]
    fn test_validation_error_display_out_of_range() {
        let err = ValidationError::OutOfRange {
            field: "per_page".to_string(),
            value: 51,
            min: 1,
            max: 50,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("per_page"));
        assert!(msg.contains("51"));
        assert!(msg.contains("1..=50"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "base_url".to_string(),
            value: "ftp://x".to_string(),
            reason: "must be an http(s) url".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("base_url"));
        assert!(msg.contains("ftp://x"));
        assert!(msg.contains("http(s)"));
    }

    #[test]
    fn test_raindrop_error_from_variants() {
        let cache = RaindropError::from(CacheError::InvalidCredential);
        assert!(matches!(cache, RaindropError::Cache(_)));

        let upstream = RaindropError::from(UpstreamError::Rejected {
            operation: "create".to_string(),
        });
        assert!(matches!(upstream, RaindropError::Upstream(_)));

        let validation = RaindropError::from(ValidationError::RequiredFieldMissing {
            field: "tags".to_string(),
        });
        assert!(matches!(validation, RaindropError::Validation(_)));

        let config = RaindropError::from(ConfigError::MissingConfigPath);
        assert!(matches!(config, RaindropError::Config(_)));
    }

    #[test]
    fn test_cancelled_is_cancelled() {
        assert!(RaindropError::Cancelled.is_cancelled());
        assert!(!RaindropError::from(CacheError::InvalidCredential).is_cancelled());
    }
}
