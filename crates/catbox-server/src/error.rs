//! HTTP error mapping
//!
//! Every handler failure is an [`AppError`]. Its response is plain text with
//! the status and message shown below, and it is logged at a level matching
//! who is at fault.
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `MethodNotAllowed` | 405 | `Method not allowed` |
//! | `ParseForm` | 400 | `Failed to parse form` |
//! | `MissingFile` | 400 | `Failed to get file` |
//! | `InvalidFilename` | 400 | `Invalid filename` |
//! | `SaveFailed` | 500 | `Failed to save file` |
//! | `ReadFailed` | 500 | `Failed to read file` |
//! | `NotFound` | 404 | `404 page not found` |

use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use catbox_storage::StorageError;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Handler error, rendered as a plain-text response
#[derive(Error, Debug)]
pub enum AppError {
    /// Non-POST request to the upload route
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Body is not a well-formed multipart form within the size ceiling
    #[error("malformed multipart form: {0}")]
    ParseForm(String),

    /// No part named `file` carrying a filename
    #[error("form has no file part named \"file\"")]
    MissingFile,

    /// Uploaded filename failed validation
    #[error(transparent)]
    InvalidFilename(StorageError),

    /// Storage rejected the write
    #[error("failed to save upload: {0}")]
    SaveFailed(StorageError),

    /// Stored file exists but could not be inspected
    #[error("failed to read file: {0}")]
    ReadFailed(StorageError),

    /// Unknown route or missing file
    #[error("not found")]
    NotFound,
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::ParseForm(_) | AppError::MissingFile | AppError::InvalidFilename(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::SaveFailed(_) | AppError::ReadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Body text sent to the client
    pub fn message(&self) -> &'static str {
        match self {
            AppError::MethodNotAllowed => "Method not allowed",
            AppError::ParseForm(_) => "Failed to parse form",
            AppError::MissingFile => "Failed to get file",
            AppError::InvalidFilename(_) => "Invalid filename",
            AppError::SaveFailed(_) => "Failed to save file",
            AppError::ReadFailed(_) => "Failed to read file",
            AppError::NotFound => "404 page not found",
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::ParseForm(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::NotFound => debug!("{}", self),
            _ if status.is_server_error() => error!("{}", self),
            _ => warn!("{}", self),
        }

        let mut response = (status, self.message()).into_response();
        if let AppError::MethodNotAllowed = self {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors() {
        assert_eq!(
            render(AppError::ParseForm("bad boundary".into())).await,
            (StatusCode::BAD_REQUEST, "Failed to parse form".to_string())
        );
        assert_eq!(
            render(AppError::MissingFile).await,
            (StatusCode::BAD_REQUEST, "Failed to get file".to_string())
        );
        assert_eq!(
            render(AppError::InvalidFilename(StorageError::invalid_name("..", "reserved"))).await,
            (StatusCode::BAD_REQUEST, "Invalid filename".to_string())
        );
    }

    #[tokio::test]
    async fn test_method_not_allowed_advertises_post() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_save_failure_hides_details() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/srv/uploads");
        let (status, body) = render(AppError::SaveFailed(StorageError::Io(io))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to save file");
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound.message(), "404 page not found");
    }
}
