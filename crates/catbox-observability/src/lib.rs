//! Catbox Observability Module
//!
//! Structured logging for the catbox service, built on `tracing`.
//!
//! # Features
//!
//! - **Multiple Output Formats**: pretty, compact and JSON
//! - **Environment-based Filtering**: `RUST_LOG` directives when no level is configured
//! - **Safe Initialization**: installing a second global subscriber is an error, not a panic
//!
//! # Example
//!
//! ```ignore
//! use catbox_observability::{init_tracing, LogConfig, LogFormat};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_tracing(LogConfig::new().with_format(LogFormat::Json))?;
//!     tracing::info!("catbox starting");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::init_tracing;
