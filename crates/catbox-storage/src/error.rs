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

//! Storage error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing the upload directory
#[derive(Error, Debug)]
pub enum StorageError {
    /// No regular file exists under the requested name
    #[error("file not found: {0}")]
    NotFound(String),

    /// Filename rejected before touching the filesystem
    #[error("invalid filename {name:?}: {reason}")]
    InvalidName {
        /// The rejected name, verbatim
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// The upload root exists but is not a directory
    #[error("upload root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Create a NotFound error for the given filename
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        StorageError::NotFound(name.into())
    }

    /// Create an InvalidName error
    pub fn invalid_name<S: Into<String>>(name: S, reason: &'static str) -> Self {
        StorageError::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Check if this is an InvalidName error
    pub fn is_invalid_name(&self) -> bool {
        matches!(self, StorageError::InvalidName { .. })
    }
}
