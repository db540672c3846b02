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

//! Storage layer for catbox
//!
//! Uploaded files are kept in one flat directory, the *upload root*. The
//! directory listing is the only index: a file's key is its original
//! filename, and a second upload under the same name replaces the first.
//!
//! # Core operations
//!
//! - [`LocalStore::save`]: stream content into `<root>/<filename>`
//! - [`LocalStore::stage`] / [`StagedUpload::commit`]: the same in two steps
//! - [`LocalStore::locate`]: find an existing file for download
//! - [`LocalStore::resolve_path`]: join root and a validated filename
//! - [`LocalStore::compute_total_bytes`]: sum sizes of all regular files
//!
//! Filenames are checked with [`validate_filename`] before any filesystem
//! access, so a name can never address anything outside the upload root.

pub mod error;
pub mod local;
pub mod name;

pub use error::{StorageError, StorageResult};
pub use local::{LocalStore, StagedUpload, STAGING_DIR};
pub use name::{upload_basename, validate_filename};
