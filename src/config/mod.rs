//! Configuration module for the admin backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT {value:?}: {source}")]
    Port {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the YAML settings file
    pub config_path: PathBuf,
    /// Path to the JSON subscriptions file
    pub subscriptions_path: PathBuf,
    /// Host name or IP address to bind to, resolved when binding
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Password for the `admin` account; unset disables it
    pub admin_password: Option<String>,
    /// Password for the `user` account; unset disables it
    pub user_password: Option<String>,
    /// Command line of the push process
    pub push_command: String,
    /// Working directory of the push process
    pub push_workdir: PathBuf,
}

impl Config {
    /// Load configuration from a `.env` file, if present, and the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_process_env()
    }

    /// Load configuration from the process environment only.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config/config.yaml".to_string())
            .into();

        let subscriptions_path = env::var("SUBSCRIPTIONS_PATH")
            .unwrap_or_else(|_| "config/subscriptions.json".to_string())
            .into();

        let host = env::var("HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let port = env::var("PORT").unwrap_or_else(|_| "5001".to_string());
        let port: u16 = port
            .parse()
            .map_err(|source| ConfigError::Port { value: port, source })?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());
        let user_password = env::var("USER_PASSWORD").ok().filter(|p| !p.is_empty());

        let push_command =
            env::var("PUSH_COMMAND").unwrap_or_else(|_| "python3 main.py".to_string());
        let push_workdir = env::var("PUSH_WORKDIR")
            .unwrap_or_else(|_| ".".to_string())
            .into();

        Ok(Self {
            config_path,
            subscriptions_path,
            host,
            port,
            log_level,
            admin_password,
            user_password,
            push_command,
            push_workdir,
        })
    }

    /// Host and port in a form `TcpListener::bind` resolves.
    pub fn bind_target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}
