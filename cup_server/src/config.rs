//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chrono::{DateTime, Utc};
use cup_bracket::{
    BracketConfig, TournamentConfig, db::DatabaseConfig, feed::DEFAULT_SUBSCRIBER_BUFFER,
    tournament::RebuildPolicy,
};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Where teams and matches are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process memory, lost on restart
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "unknown storage backend '{other}', expected 'postgres' or 'memory'"
            )),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    pub storage: StorageBackend,
    /// Database configuration, unused with the memory backend
    pub database: DatabaseConfig,
    pub tournament: TournamentConfig,
    /// Per-subscriber live feed queue depth
    pub feed_buffer: usize,
    /// Prometheus listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub storage: Option<StorageBackend>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND", DEFAULT_BIND, "expected IP:PORT")?,
        };

        let storage = match overrides.storage {
            Some(storage) => storage,
            None => match std::env::var("STORAGE_BACKEND") {
                Ok(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                    var: "STORAGE_BACKEND".to_string(),
                    reason,
                })?,
                Err(_) => StorageBackend::default(),
            },
        };

        let defaults = DatabaseConfig::development();
        let database_url = overrides
            .database_url
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or(defaults.database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        };

        let base_time = match std::env::var("TOURNAMENT_START") {
            Ok(value) => parse_start_time(&value)?,
            Err(_) => BracketConfig::default_base_time(),
        };

        let rebuild_policy = match std::env::var("REBUILD_POLICY") {
            Ok(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                var: "REBUILD_POLICY".to_string(),
                reason,
            })?,
            Err(_) => RebuildPolicy::default(),
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{value}' is not an IP:PORT address"),
                })?)
            }
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            storage,
            database,
            tournament: TournamentConfig {
                bracket: BracketConfig::new(base_time),
                rebuild_policy,
            },
            feed_buffer: parse_env_or("FEED_BUFFER", DEFAULT_SUBSCRIBER_BUFFER),
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: "FEED_BUFFER".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.storage == StorageBackend::Postgres {
            if self.database.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }

            if self.database.min_connections > self.database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        self.database.max_connections
                    ),
                });
            }
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_start_time(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ConfigError::Invalid {
            var: "TOURNAMENT_START".to_string(),
            reason: format!("'{value}' is not an RFC 3339 timestamp: {e}"),
        })
}

/// Like [`parse_env_or`], but a set-and-unparsable value is an error
fn parse_env_strict<T>(key: &str, default: &str, hint: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{value}': {hint}"),
    })
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
