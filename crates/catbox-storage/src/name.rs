//! Filename checks for the flat upload directory
//!
//! Every stored file lives directly under the upload root, so a valid name is
//! exactly one normal path component.

use crate::error::{StorageError, StorageResult};
use crate::local::STAGING_DIR;

/// Validate that `name` is a single, non-special path component.
///
/// Rejects empty names, `.` and `..`, names containing `/` or `\`, names
/// containing NUL bytes, and the staging directory name.
pub fn validate_filename(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::invalid_name(name, "empty filename"));
    }

    if name == "." || name == ".." {
        return Err(StorageError::invalid_name(name, "path traversal"));
    }

    if name == STAGING_DIR {
        return Err(StorageError::invalid_name(name, "reserved name"));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(StorageError::invalid_name(name, "path separators not allowed"));
    }

    if name.contains('\0') {
        return Err(StorageError::invalid_name(name, "null bytes not allowed"));
    }

    Ok(())
}

/// Reduce a client-supplied upload filename to its final path component.
///
/// Some clients send the full local path of the file (`C:\Users\me\cat.png`);
/// only the last component is kept. The result still has to pass
/// [`validate_filename`].
pub fn upload_basename(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}
