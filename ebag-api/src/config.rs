//! API Configuration Module
//!
//! Server, cache store and logging settings, loaded from environment
//! variables with defaults suited to local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use ebag_core::ConfigError;
use ebag_storage::{map_size_bytes, CacheConfig};

// ============================================================================
// LOG FORMAT
// ============================================================================

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::InvalidValue {
                field: "EBAG_LOG_FORMAT".to_string(),
                value: raw.to_string(),
                reason: "expected 'json' or 'pretty'".to_string(),
            }),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Configuration for the demo API server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to bind.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Cache-aside accessor settings.
    pub cache: CacheConfig,

    /// Directory for the LMDB cache store. `None` keeps the cache in memory.
    pub lmdb_path: Option<PathBuf>,

    /// LMDB map size in megabytes.
    pub lmdb_size_mb: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(), // Empty = allow all
            cache: CacheConfig::default(),
            lmdb_path: None,
            lmdb_size_mb: 64,
            log_format: LogFormat::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `EBAG_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `EBAG_API_PORT`: Port to bind (default: 8080)
    /// - `EBAG_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `EBAG_CACHE_TTL_SECS`, `EBAG_CACHE_ENABLED`: see [`CacheConfig::from_env`]
    /// - `EBAG_CACHE_LMDB_PATH`: LMDB directory (unset = in-memory cache)
    /// - `EBAG_CACHE_LMDB_SIZE_MB`: LMDB map size (default: 64)
    /// - `EBAG_LOG_FORMAT`: "json" or "pretty" (default: json)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_host = lookup("EBAG_API_BIND").unwrap_or(defaults.bind_host);

        let port = match lookup("PORT").or_else(|| lookup("EBAG_API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                value: raw.clone(),
                reason: "must be a port number".to_string(),
            })?,
            None => defaults.port,
        };

        let cors_origins = lookup("EBAG_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cache = CacheConfig::from_lookup(&lookup)?;

        let lmdb_path = lookup("EBAG_CACHE_LMDB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let lmdb_size_mb = match lookup("EBAG_CACHE_LMDB_SIZE_MB") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(mb) if mb > 0 && map_size_bytes(mb).is_some() => mb,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "EBAG_CACHE_LMDB_SIZE_MB".to_string(),
                        value: raw,
                        reason: "must be a positive number of megabytes that fits in memory"
                            .to_string(),
                    })
                }
            },
            None => defaults.lmdb_size_mb,
        };

        let log_format = match lookup("EBAG_LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw)?,
            None => defaults.log_format,
        };

        Ok(Self {
            bind_host,
            port,
            cors_origins,
            cache,
            lmdb_path,
            lmdb_size_mb,
            log_format,
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "EBAG_API_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_full_environment() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("EBAG_API_BIND", "127.0.0.1"),
            ("EBAG_API_PORT", "9000"),
            ("EBAG_CORS_ORIGINS", "https://a.example, ,https://b.example"),
            ("EBAG_CACHE_TTL_SECS", "60"),
            ("EBAG_CACHE_LMDB_PATH", "/var/cache/ebag"),
            ("EBAG_CACHE_LMDB_SIZE_MB", "128"),
            ("EBAG_LOG_FORMAT", "pretty"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.cache.default_ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.lmdb_path, Some(PathBuf::from("/var/cache/ebag")));
        assert_eq!(config.lmdb_size_mb, 128);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_port_takes_precedence() {
        let config =
            ApiConfig::from_lookup(lookup_from(&[("PORT", "3000"), ("EBAG_API_PORT", "9000")]))
                .unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ApiConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(ApiConfig::from_lookup(lookup_from(&[("EBAG_CACHE_LMDB_SIZE_MB", "0")])).is_err());
        let huge = usize::MAX.to_string();
        assert!(
            ApiConfig::from_lookup(lookup_from(&[("EBAG_CACHE_LMDB_SIZE_MB", huge.as_str())]))
                .is_err()
        );
        assert!(ApiConfig::from_lookup(lookup_from(&[("EBAG_LOG_FORMAT", "xml")])).is_err());

        let config = ApiConfig::from_lookup(lookup_from(&[("EBAG_API_BIND", "not a host")]))
            .unwrap();
        assert!(config.bind_addr().is_err());
    }
}
