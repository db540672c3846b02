//! Request handlers for the catbox routes

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, Request, State,
    },
    response::{Html, IntoResponse, Response},
};
use catbox_storage::{upload_basename, validate_filename, StagedUpload, StorageError};
use futures::TryStreamExt;
use std::io;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info};

use crate::error::AppError;
use crate::pages;
use crate::state::AppState;

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// GET / - Upload page
pub async fn index() -> Html<&'static str> {
    Html(pages::INDEX_HTML)
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "OK"
}

/// POST /upload - Store the `file` part of a multipart form
///
/// The part's filename is cut down to its last path component and then
/// validated; its content is streamed into staging without buffering the
/// whole file in the handler. The rest of the form must parse before the
/// upload becomes visible, so a form that is malformed after the `file`
/// part stores nothing. The storage gauge is refreshed before the success
/// page is returned.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, AppError> {
    let mut multipart = multipart.map_err(|rejection| AppError::ParseForm(rejection.body_text()))?;

    let mut staged = None;
    if let Err(e) = read_form(&state, &mut multipart, &mut staged).await {
        if let Some((_, upload)) = staged {
            upload.discard().await;
        }
        return Err(e);
    }
    let Some((filename, upload)) = staged else {
        return Err(AppError::MissingFile);
    };

    let written = upload.commit().await.map_err(AppError::SaveFailed)?;
    info!("Stored {} ({} bytes)", filename, written);

    state.refresh_storage_bytes().await;

    let page = pages::upload_success(&filename, &state.download_url(&filename));
    Ok(Html(page))
}

/// Walk every field of the form, staging the first usable `file` part.
///
/// Later fields, including further `file` parts, are read and dropped so a
/// truncated or malformed tail is reported as an error.
async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
    staged: &mut Option<(String, StagedUpload)>,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if staged.is_some() || field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A file input submitted with nothing selected has an empty filename
        let Some(raw_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        let filename = upload_basename(&raw_name).to_owned();
        validate_filename(&filename).map_err(AppError::InvalidFilename)?;

        let content = std::pin::pin!(StreamReader::new(field.map_err(io::Error::other)));
        let upload = state
            .store
            .stage(&filename, content)
            .await
            .map_err(save_error)?;
        debug!("Staged {} ({} bytes)", filename, upload.written());
        *staged = Some((filename, upload));
    }
    Ok(())
}

/// Any method other than POST on /upload
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// GET /files/:name - Stream a stored file
///
/// Delegates to [`ServeFile`], which sets `Content-Type` from the extension
/// and answers `Range` and conditional requests.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    let path = match state.store.locate(&name).await {
        Ok(path) => path,
        Err(e @ (StorageError::NotFound(_) | StorageError::InvalidName { .. })) => {
            debug!("GET /files/{}: {}", name, e);
            return AppError::NotFound.into_response();
        }
        Err(e) => return AppError::ReadFailed(e).into_response(),
    };

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Fallback for unmapped paths
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// A read error from the multipart stream is the client's fault, anything
/// else went wrong on our side.
fn save_error(err: StorageError) -> AppError {
    match err {
        StorageError::Io(ref io_err)
            if io_err
                .get_ref()
                .is_some_and(|inner| inner.is::<MultipartError>()) =>
        {
            AppError::ParseForm(err.to_string())
        }
        StorageError::InvalidName { .. } => AppError::InvalidFilename(err),
        _ => AppError::SaveFailed(err),
    }
}
