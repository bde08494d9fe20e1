//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a valid PNG image
pub fn assert_png(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );
    assert_eq!(response.header("content-type"), Some("image/png"));
}

/// Assert an error response with the `{"status", "error"}` body
pub fn assert_api_error(response: &TestResponse, expected: StatusCode, message: &str) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"].as_u64(), Some(expected.as_u16() as u64));
    assert_eq!(
        json["error"].as_str(),
        Some(message),
        "Full response: {}",
        serde_json::to_string_pretty(&json).unwrap()
    );
}

/// Assert the 404 given for unknown and unfinished jobs alike
pub fn assert_job_not_found(response: &TestResponse) {
    assert_api_error(
        response,
        StatusCode::NOT_FOUND,
        "Job not found or still processing",
    );
}

/// Assert a completed job status and return the reported output path
pub fn assert_completed(response: &TestResponse, job_id: &str) -> String {
    assert_ok(response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "completed", "Full response: {json}");
    assert_eq!(
        json["result"]["downloadUrl"].as_str(),
        Some(format!("/v1/output/{job_id}").as_str())
    );

    let output_path = json["result"]["outputPath"]
        .as_str()
        .expect("outputPath should be a string")
        .to_string();
    assert!(
        std::path::Path::new(&output_path).is_absolute(),
        "outputPath should be absolute: {output_path}"
    );
    assert!(output_path.ends_with(&format!("{job_id}.png")));
    output_path
}

/// Assert a failed job status and return the error detail
pub fn assert_failed(response: &TestResponse) -> String {
    assert_ok(response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "failed", "Full response: {json}");
    json["error"]
        .as_str()
        .expect("error should be a string")
        .to_string()
}
