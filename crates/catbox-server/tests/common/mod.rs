//! Shared helpers for router-level tests

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use catbox_metrics::MetricsRegistry;
use catbox_server::{create_router, AppState, ServerConfig};
use catbox_storage::{LocalStore, STAGING_DIR};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "catbox-test-boundary";

/// Router over a fresh upload directory
pub struct TestApp {
    pub dir: TempDir,
    pub state: Arc<AppState>,
    pub app: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn test_app() -> TestApp {
    test_app_with(ServerConfig::default()).await
}

pub async fn test_app_with(config: ServerConfig) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(dir.path()).await.unwrap();
    let state = Arc::new(AppState::new(
        &config,
        store,
        MetricsRegistry::new().unwrap(),
    ));
    let app = create_router(Arc::clone(&state));
    TestApp { dir, state, app }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn upload(&self, filename: &str, content: &[u8]) -> TestResponse {
        self.send(upload_request(filename, content)).await
    }

    /// Body of `GET /metrics`
    pub async fn scrape(&self) -> String {
        let response = self.get("/metrics").await;
        assert_eq!(response.status, StatusCode::OK);
        response.text()
    }

    /// Names in the upload directory, sorted, without the staging directory
    pub fn stored_files(&self) -> Vec<String> {
        list_dir(self.dir.path())
    }

    /// Files left in the staging directory
    pub fn staged_files(&self) -> Vec<String> {
        let staging = self.dir.path().join(STAGING_DIR);
        if staging.exists() {
            list_dir(&staging)
        } else {
            Vec::new()
        }
    }
}

pub fn list_dir(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != STAGING_DIR)
        .collect();
    names.sort();
    names
}

/// One part of a hand-built multipart body
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            }
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    multipart_request(&[Part {
        name: "file",
        filename: Some(filename),
        content,
    }])
}

/// Value of the first exposition line starting with `series`
pub fn sample(text: &str, series: &str) -> Option<f64> {
    text.lines()
        .find(|line| line.starts_with(series))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

pub fn requests_total(text: &str, method: &str, path: &str, status: u16) -> f64 {
    let series = format!(
        "http_requests_total{{method=\"{}\",path=\"{}\",status=\"{}\"}}",
        method, path, status
    );
    sample(text, &series).unwrap_or(0.0)
}

pub fn duration_count(text: &str, method: &str, path: &str) -> f64 {
    let series = format!(
        "http_request_duration_seconds_count{{method=\"{}\",path=\"{}\"}}",
        method, path
    );
    sample(text, &series).unwrap_or(0.0)
}
