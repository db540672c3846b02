//! Server configuration
//!
//! Sources, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config <path>`, else `catbox.toml` if present)
//! 3. `CATBOX_*` environment variables
//! 4. command-line flags (applied by the binary)
//!
//! [`ServerConfig::load`] covers the first three; call
//! [`ServerConfig::validate`] once flags have been applied.

use catbox_observability::{LogConfig, LogFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "catbox.toml";

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ServerConfig`]
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// Environment variable holds a value of the wrong shape
    #[error("invalid value {value:?} for environment variable {variable_name}: {reason}")]
    EnvVarParsing {
        /// Variable name
        variable_name: String,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Merged configuration is inconsistent
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create an [`ConfigError::EnvVarParsing`] error
    pub fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsing {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a [`ConfigError::Validation`] error
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation(message.into())
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory uploads are stored in
    pub upload_dir: PathBuf,

    /// Base URL used in download links
    pub public_url: String,

    /// Multipart body ceiling for `/upload`
    pub max_upload_bytes: usize,

    /// Ceiling for request bodies buffered by the metrics middleware
    pub max_request_bytes: usize,

    /// Per-request timeout in seconds, 0 disables
    pub request_timeout_secs: u64,

    /// Storage gauge refresh interval in seconds, 0 disables
    pub storage_scan_interval_secs: u64,

    /// Logging
    pub log: LogSettings,
}

/// `[log]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// Filter directives; `RUST_LOG` applies when unset
    pub level: Option<String>,

    /// Output format
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::Pretty,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            upload_dir: PathBuf::from("./uploads"),
            public_url: "http://localhost:8080".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            max_request_bytes: 16 * 1024 * 1024,
            request_timeout_secs: 30,
            storage_scan_interval_secs: 0,
            log: LogSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load defaults, then the config file, then environment overrides.
    ///
    /// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_FILE`]
    /// is used only if present. The result is not yet validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `CATBOX_*` overrides, reading variables through `lookup`
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CATBOX_HOST") {
            self.host = value;
        }
        if let Some(value) = lookup("CATBOX_PORT") {
            self.port = parse_env("CATBOX_PORT", &value)?;
        }
        if let Some(value) = lookup("CATBOX_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("CATBOX_PUBLIC_URL") {
            self.public_url = value;
        }
        if let Some(value) = lookup("CATBOX_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("CATBOX_MAX_UPLOAD_BYTES", &value)?;
        }
        if let Some(value) = lookup("CATBOX_MAX_REQUEST_BYTES") {
            self.max_request_bytes = parse_env("CATBOX_MAX_REQUEST_BYTES", &value)?;
        }
        if let Some(value) = lookup("CATBOX_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("CATBOX_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("CATBOX_STORAGE_SCAN_INTERVAL_SECS") {
            self.storage_scan_interval_secs =
                parse_env("CATBOX_STORAGE_SCAN_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("CATBOX_LOG_LEVEL") {
            self.log.level = Some(value);
        }
        if let Some(value) = lookup("CATBOX_LOG_FORMAT") {
            self.log.format = parse_env("CATBOX_LOG_FORMAT", &value)?;
        }
        Ok(())
    }

    /// Check the merged configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("host must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::validation("port must not be 0"));
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::validation("upload_dir must not be empty"));
        }
        if !(self.public_url.starts_with("http://") || self.public_url.starts_with("https://")) {
            return Err(ConfigError::validation(format!(
                "public_url must start with http:// or https://, got {:?}",
                self.public_url
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::validation("max_upload_bytes must not be 0"));
        }
        if self.max_request_bytes < self.max_upload_bytes {
            return Err(ConfigError::validation(format!(
                "max_request_bytes ({}) must be at least max_upload_bytes ({})",
                self.max_request_bytes, self.max_upload_bytes
            )));
        }
        Ok(())
    }

    /// Get the full bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public URL without trailing slashes
    pub fn public_base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    /// Request timeout, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Storage scan interval, `None` when disabled
    pub fn storage_scan_interval(&self) -> Option<Duration> {
        (self.storage_scan_interval_secs > 0)
            .then(|| Duration::from_secs(self.storage_scan_interval_secs))
    }

    /// Logging configuration for `catbox_observability::init_tracing`
    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::new().with_format(self.log.format);
        match &self.log.level {
            Some(level) => config.with_level(level.clone()),
            None => config,
        }
    }
}

fn parse_env<T>(variable: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::env_var_parsing_error(variable, value, e.to_string()))
}
