//! Shared fixtures for HTTP tests: an in-memory application state, account
//! helpers and a hand-rolled multipart body builder.
#![allow(dead_code)]

use actix_web::http::header;
use actix_web::web;
use blog_service::config::{FeedConfig, UploadConfig};
use blog_service::db::InMemoryStore;
use blog_service::uploads::UploadStore;
use blog_service::AppState;
use crypto_core::JwtKeys;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"blog-service-http-test-secret-value";
pub const BOUNDARY: &str = "quill-test-boundary-7MA4YWxkTrZu0gW";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<InMemoryStore>,
    pub keys: JwtKeys,
    pub upload_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_feed(FeedConfig::default())
    }

    pub fn with_feed(feed: FeedConfig) -> Self {
        let upload_dir = tempfile::tempdir().expect("temp upload dir");
        let uploads = UploadStore::new(&UploadConfig {
            dir: upload_dir.path().to_path_buf(),
            max_file_bytes: 64 * 1024,
        });
        let keys = JwtKeys::from_secret(TEST_SECRET, 30).expect("test keys");
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::with_memory(store.clone(), keys.clone(), uploads, feed);

        Self {
            state: web::Data::new(state),
            store,
            keys,
            upload_dir,
        }
    }

    /// Create an account directly through the service layer.
    pub async fn register(&self, first_name: &str) -> (String, Uuid) {
        let email = format!("{}@example.com", first_name.to_lowercase());
        let session = self
            .state
            .account_service()
            .signup(first_name, "Tester", &email, "password123")
            .await
            .expect("signup");
        (session.token, session.user.id)
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// Build a `multipart/form-data` body; returns (content type, body).
pub fn multipart(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub fn png(field: &'static str, file_name: &'static str) -> FilePart<'static> {
    FilePart {
        field,
        file_name,
        content_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake-png-bytes",
    }
}
