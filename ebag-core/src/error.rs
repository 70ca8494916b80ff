//! Error types for ebag operations

use thiserror::Error;

/// Cache store and codec errors.
///
/// None of these ever escape `CacheAside::get`; the accessor downgrades
/// them to a miss. They surface only from explicit store calls such as
/// `put` and `invalidate`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Failed to serialize value for key {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Failed to deserialize value for key {key}: {reason}")]
    Deserialization { key: String, reason: String },

    #[error("Invalid cache key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

/// System-of-record errors raised by record-store suppliers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Query {query} failed: {reason}")]
    QueryFailed { query: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Envelope rendering errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Failed to serialize payload: {reason}")]
    Serialization { reason: String },

    #[error("Invalid JSONP callback name {callback:?}: {reason}")]
    InvalidCallback { callback: String, reason: String },
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        EnvelopeError::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all ebag errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EbagError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for ebag operations.
pub type EbagResult<T> = Result<T, EbagError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display_deserialization() {
        let err = CacheError::Deserialization {
            key: "demo_1".to_string(),
            reason: "expected struct Demo".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("deserialize"));
        assert!(msg.contains("demo_1"));
        assert!(msg.contains("expected struct Demo"));
    }

    #[test]
    fn test_storage_error_display_query_failed() {
        let err = StorageError::QueryFailed {
            query: "find_demo_by_id".to_string(),
            reason: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Query find_demo_by_id failed: connection reset");
    }

    #[test]
    fn test_envelope_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err = EnvelopeError::from(json_err);
        assert!(matches!(err, EnvelopeError::Serialization { .. }));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "EBAG_CACHE_TTL_SECS".to_string(),
            value: "soon".to_string(),
            reason: "must be a whole number of seconds".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("EBAG_CACHE_TTL_SECS"));
        assert!(msg.contains("soon"));
        assert!(msg.contains("whole number"));
    }

    #[test]
    fn test_ebag_error_from_variants() {
        let cache = EbagError::from(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        });
        assert!(matches!(cache, EbagError::Cache(_)));

        let storage = EbagError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, EbagError::Storage(_)));

        let envelope = EbagError::from(EnvelopeError::InvalidCallback {
            callback: "alert(1)".to_string(),
            reason: "not an identifier".to_string(),
        });
        assert!(matches!(envelope, EbagError::Envelope(_)));

        let config = EbagError::from(ConfigError::InvalidValue {
            field: "PORT".to_string(),
            value: "x".to_string(),
            reason: "not a port".to_string(),
        });
        assert!(matches!(config, EbagError::Config(_)));
    }
}
