//! Configuration module for mailcast-server.
//!
//! Handles loading configuration from the CLI, an optional TOML file and
//! environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{PublisherConfig, ServerConfig, SharedConfig, SubscriberConfig};
use mailcast_core::broadcast::BroadcastConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the expected SNS topic ARN.
pub const SNS_ARN_ENV: &str = "SNS_ARN";

/// Environment variable holding the Postgres connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("SNS topic ARN not configured; set {SNS_ARN_ENV} or [publisher] topic_arn")]
    MissingTopicArn,

    #[error("{DATABASE_URL_ENV} environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub publisher: PublisherConfig,
    pub subscriber: SubscriberConfig,
    pub broadcast: BroadcastConfig,
}

impl LoadedConfig {
    /// Wrap the reloadable sections in a SharedConfig.
    ///
    /// The server and broadcast sections are consumed separately at startup.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.publisher, self.subscriber)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    listen: String,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: Option<&Path>, listen: impl Into<String>) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            listen: listen.into(),
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if one was given
    /// 2. Apply the `SNS_ARN` environment override
    /// 3. Validate the result
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = match &self.config_path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => FileConfig::default(),
        };
        self.build(file_config, std::env::var(SNS_ARN_ENV).ok())
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn build(
        &self,
        file_config: FileConfig,
        sns_arn: Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        let topic_arn = sns_arn
            .or(file_config.publisher.topic_arn)
            .filter(|arn| !arn.trim().is_empty())
            .ok_or(ConfigError::MissingTopicArn)?;

        if file_config.broadcast.max_event_age_secs == 0 {
            return Err(ConfigError::ValidationError(
                "broadcast.max_event_age_secs must be positive".to_string(),
            ));
        }
        if let Some(pattern) = file_config
            .subscriber
            .allowed_origins
            .iter()
            .find(|p| p.trim().is_empty() || p.contains("://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "allowed origin {pattern:?} must be a host pattern, not a URL"
            )));
        }

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: self.listen.clone(),
                shutdown_grace: Duration::from_millis(file_config.server.shutdown_grace_ms),
            },
            publisher: PublisherConfig { topic_arn },
            subscriber: SubscriberConfig {
                allowed_origins: file_config.subscriber.allowed_origins,
            },
            broadcast: BroadcastConfig {
                max_event_age: Duration::from_secs(file_config.broadcast.max_event_age_secs),
            },
        })
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var(DATABASE_URL_ENV).map_err(|_| ConfigError::MissingDatabaseUrl)
}
