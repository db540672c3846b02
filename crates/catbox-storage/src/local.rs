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

//! Local filesystem upload store
//!
//! Files are stored flatly under a single upload root, keyed by their
//! original filename:
//!
//! ```text
//! uploads/
//!   hello.txt
//!   cat.png
//! ```
//!
//! Writes are staged in `<root>/.staging/upload-<pid>-<seq>.part` and renamed
//! into place on [`StagedUpload::commit`], so readers never see a half-written
//! upload. The staging directory is skipped by [`LocalStore::compute_total_bytes`]
//! and its name is reserved, so it can neither be downloaded nor overwritten.
//!
//! # Examples
//!
//! ```rust,no_run
//! use catbox_storage::LocalStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), catbox_storage::StorageError> {
//! let store = LocalStore::new("./uploads").await?;
//!
//! let written = store.save("hello.txt", &b"hi"[..]).await?;
//! assert_eq!(written, 2);
//!
//! // Two-phase: nothing is visible until commit
//! let staged = store.stage("later.txt", &b"bye"[..]).await?;
//! staged.commit().await?;
//!
//! let path = store.locate("hello.txt").await?;
//! println!("stored at {}", path.display());
//!
//! println!("{} bytes on disk", store.compute_total_bytes().await?);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::name::validate_filename;

/// Directory under the upload root holding uploads still being written
pub const STAGING_DIR: &str = ".staging";

/// Flat upload directory on the local filesystem
///
/// Cheap to clone; clones share the staging sequence counter. Safe to use
/// from any number of concurrent tasks: uploads of different names are
/// independent and uploads of the same name race with last-writer-wins.
#[derive(Clone)]
pub struct LocalStore {
    root: PathBuf,
    staging_seq: Arc<AtomicU64>,
}

impl LocalStore {
    /// Open the upload root, creating it if it doesn't exist.
    ///
    /// # Errors
    ///
    /// * [`StorageError::NotADirectory`] if the path exists but is a file
    /// * [`StorageError::Io`] if the directory cannot be created
    pub async fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StorageError::NotADirectory(root)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&root).await?;
                debug!("Created upload root {}", root.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            root,
            staging_seq: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Get the upload root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join the upload root with a validated filename.
    ///
    /// Does not check whether the file exists; see [`LocalStore::locate`].
    pub fn resolve_path(&self, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    /// Resolve `filename` to an existing regular file.
    ///
    /// Directories, missing entries and invalid names all report
    /// [`StorageError::NotFound`] or [`StorageError::InvalidName`].
    pub async fn locate(&self, filename: &str) -> StorageResult<PathBuf> {
        let path = self.resolve_path(filename)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::not_found(filename)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(filename))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Copy `content` into `<root>/<filename>`, replacing any existing file.
    ///
    /// Shorthand for [`stage`](Self::stage) followed by
    /// [`StagedUpload::commit`]. Returns the number of bytes written.
    pub async fn save<R>(&self, filename: &str, content: R) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        self.stage(filename, content).await?.commit().await
    }

    /// Copy `content` into a staging file for `filename`.
    ///
    /// Nothing is visible under `filename` until the returned
    /// [`StagedUpload`] is committed. If reading `content` or writing the
    /// staging file fails, the staging file is removed and the previous file
    /// under `filename` (if any) is left untouched.
    pub async fn stage<R>(&self, filename: &str, mut content: R) -> StorageResult<StagedUpload>
    where
        R: AsyncRead + Unpin,
    {
        let target = self.resolve_path(filename)?;
        let staging_dir = self.staging_dir();
        // Not create_dir_all: a vanished upload root must stay an error
        match fs::create_dir(&staging_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
        let staging = staging_dir.join(format!("upload-{}-{}.part", std::process::id(), seq));

        let mut staged = StagedUpload {
            staging: Some(staging.clone()),
            target,
            written: 0,
        };

        match write_staged(&staging, &mut content).await {
            Ok(n) => {
                staged.written = n;
                Ok(staged)
            }
            Err(e) => {
                staged.discard().await;
                Err(e.into())
            }
        }
    }

    /// Sum the sizes of every regular file under the upload root.
    ///
    /// Walks nested directories too, except the staging directory. Symlinks
    /// are not followed and not counted. Any traversal error aborts the walk
    /// and is returned.
    pub async fn compute_total_bytes(&self) -> StorageResult<u64> {
        let staging_dir = self.staging_dir();
        let mut total: u64 = 0;
        let mut work_queue = vec![self.root.clone()];

        while let Some(dir) = work_queue.pop() {
            let mut entries = fs::read_dir(&dir).await?;

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    let path = entry.path();
                    if path != staging_dir {
                        work_queue.push(path);
                    }
                } else if file_type.is_file() {
                    total += entry.metadata().await?.len();
                }
            }
        }

        Ok(total)
    }

    fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore")
            .field("root", &self.root)
            .finish()
    }
}

/// Upload fully written to the staging directory but not yet visible
///
/// Dropping it without calling [`commit`](Self::commit) removes the
/// staging file.
#[derive(Debug)]
pub struct StagedUpload {
    staging: Option<PathBuf>,
    target: PathBuf,
    written: u64,
}

impl StagedUpload {
    /// Bytes copied into the staging file
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Rename the staging file over the target, replacing any previous file.
    pub async fn commit(mut self) -> StorageResult<u64> {
        let Some(staging) = self.staging.take() else {
            return Ok(self.written);
        };

        if let Err(e) = fs::rename(&staging, &self.target).await {
            log_cleanup(&staging, fs::remove_file(&staging).await);
            return Err(e.into());
        }

        debug!("Stored {} ({} bytes)", self.target.display(), self.written);
        Ok(self.written)
    }

    /// Remove the staging file without touching the target.
    pub async fn discard(mut self) {
        if let Some(staging) = self.staging.take() {
            log_cleanup(&staging, fs::remove_file(&staging).await);
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        // Reached when the owning request is cancelled mid-upload
        if let Some(staging) = self.staging.take() {
            log_cleanup(&staging, std::fs::remove_file(&staging));
        }
    }
}

async fn write_staged<R>(staging: &Path, content: &mut R) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = fs::File::create(staging).await?;
    let written = tokio::io::copy(content, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn log_cleanup(staging: &Path, result: io::Result<()>) {
    if let Err(e) = result {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove staging file {}: {}", staging.display(), e);
        }
    }
}
