//! Embedded web frontend.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::assets::AssetLoader;

fn serve(path: &str) -> Response {
    match AssetLoader::static_file(path) {
        Some(file) => ([(header::CONTENT_TYPE, file.content_type)], file.data).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

pub async fn handle_index() -> Response {
    serve("index.html")
}

pub async fn handle_static(Path(path): Path<String>) -> Response {
    serve(&path)
}
