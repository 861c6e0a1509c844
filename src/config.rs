//! Configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Server configuration, read from `ONBOARDING_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind the HTTP server to.
    pub bind: String,
    pub port: u16,
    /// Path of the local libSQL database file.
    pub db_path: PathBuf,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
    /// Directory for daily-rotated log files. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            db_path: PathBuf::from("./data/onboarding.db"),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind = lookup("ONBOARDING_BIND").unwrap_or(defaults.bind);

        let port = match lookup("ONBOARDING_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "ONBOARDING_PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => defaults.port,
        };

        let db_path = lookup("ONBOARDING_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let bcrypt_cost = match lookup("ONBOARDING_BCRYPT_COST") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "ONBOARDING_BCRYPT_COST".to_string(),
                    message: format!("'{raw}' is not a number"),
                })?
                .clamp(4, 31),
            None => defaults.bcrypt_cost,
        };

        let log_dir = lookup("ONBOARDING_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            bind,
            port,
            db_path,
            bcrypt_cost,
            log_dir,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "ONBOARDING_DB_PATH".to_string(),
                hint: "Set it to a writable file path, e.g. ./data/onboarding.db".to_string(),
            });
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "ONBOARDING_BIND".to_string(),
                message: format!("'{}' is not a valid IP address", self.bind),
            })
    }
}
