//! Configuration for structured logging.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Errors that can occur while configuring or installing logging
#[derive(Error, Debug)]
pub enum LogError {
    /// Format name other than `pretty`, `compact` or `json`
    #[error("unknown log format {0:?}, expected one of: pretty, compact, json")]
    InvalidFormat(String),

    /// Level string is not a valid `EnvFilter` directive
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// The directive as given
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber was installed earlier
    #[error("global logger already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Output format for logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-readable
    #[default]
    Pretty,

    /// Single line per event
    Compact,

    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

/// Log output destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogOutput {
    /// Standard error
    #[default]
    Stderr,
    /// Standard output
    Stdout,
}

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format for logs
    pub format: LogFormat,

    /// Filter directives (e.g. `"info"`, `"catbox_server=debug,tower_http=info"`).
    /// If None, `RUST_LOG` is consulted.
    pub level: Option<String>,

    /// ANSI colors (ignored for JSON)
    pub use_color: bool,

    /// Prefix each event with a timestamp
    pub use_timestamps: bool,

    /// Include the emitting module path
    pub include_targets: bool,

    /// Where events are written
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Pretty,
            level: None,
            use_color: true,
            use_timestamps: true,
            include_targets: true,
            output: LogOutput::Stderr,
        }
    }
}

impl LogConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set filter directives, overriding `RUST_LOG`
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Enable or disable ANSI colors
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Enable or disable timestamps
    pub fn with_timestamps(mut self, use_timestamps: bool) -> Self {
        self.use_timestamps = use_timestamps;
        self
    }

    /// Enable or disable target names
    pub fn with_targets(mut self, include_targets: bool) -> Self {
        self.include_targets = include_targets;
        self
    }

    /// Set output destination
    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Effective filter: explicit level, else `RUST_LOG`, else `info`
    pub fn effective_level(&self) -> String {
        self.effective_level_with(|key| std::env::var(key).ok())
    }

    /// [`effective_level`](Self::effective_level) with an injectable
    /// environment lookup.
    pub fn effective_level_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        self.level
            .clone()
            .filter(|level| !level.trim().is_empty())
            .or_else(|| lookup("RUST_LOG").filter(|level| !level.trim().is_empty()))
            .unwrap_or_else(|| "info".to_string())
    }
}
