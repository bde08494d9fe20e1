//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

use recolor::assets::AssetLoader;
use recolor::models::AppConfig;
use recolor::server::{build_router, create_app_state, AppState};

const BOUNDARY: &str = "recolor-test-boundary";

/// Test application with router, state and throwaway storage directories
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    upload_dir: TempDir,
    output_dir: TempDir,
}

impl TestApp {
    /// Create a new test application using the embedded config
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test application after adjusting the embedded config
    pub fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let upload_dir = TempDir::new().expect("Failed to create upload dir");
        let output_dir = TempDir::new().expect("Failed to create output dir");

        let mut config = AppConfig::load_from_assets(&AssetLoader::new(None))
            .with_storage_overrides(
                Some(upload_dir.path().to_path_buf()),
                Some(output_dir.path().to_path_buf()),
            );
        customize(&mut config);

        let state = create_app_state(config).expect("Failed to create app state");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            upload_dir,
            output_dir,
        }
    }

    /// Run the worker until the queue is empty
    pub async fn drain(&self) -> usize {
        self.state.worker.drain().await
    }

    /// Files currently in the upload directory
    pub fn uploads(&self) -> Vec<PathBuf> {
        list_dir(&self.state.config.storage.upload_dir)
    }

    /// Files currently in the output directory
    pub fn outputs(&self) -> Vec<PathBuf> {
        list_dir(&self.state.config.storage.output_dir)
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a GET request with custom headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::get(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// POST a multipart form
    pub async fn post_multipart(&self, path: &str, form: MultipartForm) -> TestResponse {
        let request = Request::post(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(form.into_body()))
            .unwrap();
        self.request(request).await
    }

    /// Submit a PNG with a color list and return the job id
    pub async fn submit_png(&self, png: Vec<u8>, colors: &str) -> String {
        let form = MultipartForm::new()
            .file("file", "image.png", Some("image/png"), png)
            .text("colors", colors);
        let response = self.post_multipart("/v1/convert-async", form).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "submission failed: {}",
            response.text()
        );

        let json: serde_json::Value = response.json();
        json["jobId"]
            .as_str()
            .expect("jobId missing from response")
            .to_string()
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn list_dir(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| entries.flatten().map(|e| e.path()).collect())
        .unwrap_or_default();
    files.sort();
    files
}

/// Builder for `multipart/form-data` request bodies
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(
        mut self,
        name: &str,
        file_name: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Self {
        let mut head = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
        );
        if let Some(content_type) = content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");

        self.body.extend_from_slice(head.as_bytes());
        self.body.extend_from_slice(&data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_body(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get a header value as string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
