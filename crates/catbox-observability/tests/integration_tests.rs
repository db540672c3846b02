// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Integration tests for logging setup
//!
//! Only one global subscriber can be installed per process, so exactly one
//! test here calls `init_tracing`.

use catbox_observability::{init_tracing, LogConfig, LogError, LogFormat, LogOutput};

#[test]
fn test_config_builder_chaining() {
    let config = LogConfig::new()
        .with_format(LogFormat::Json)
        .with_level("debug")
        .with_timestamps(false)
        .with_color(false)
        .with_targets(false)
        .with_output(LogOutput::Stdout);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, Some("debug".to_string()));
    assert!(!config.use_timestamps);
    assert!(!config.use_color);
    assert!(!config.include_targets);
    assert_eq!(config.output, LogOutput::Stdout);
}

#[test]
fn test_default_config() {
    let config = LogConfig::default();
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.output, LogOutput::Stderr);
    assert_eq!(config.level, None);
    assert!(config.use_color);
    assert!(config.use_timestamps);
}

#[test]
fn test_second_init_is_an_error() {
    let config = LogConfig::new()
        .with_format(LogFormat::Compact)
        .with_level("info");

    init_tracing(config.clone()).unwrap();
    tracing::info!("subscriber installed");

    let err = init_tracing(config).unwrap_err();
    assert!(matches!(err, LogError::AlreadyInitialized(_)));
}

#[test]
fn test_bad_filter_fails_before_install() {
    let err = init_tracing(LogConfig::new().with_level("catbox_server=loud")).unwrap_err();
    assert!(matches!(err, LogError::InvalidFilter { .. }));
}
