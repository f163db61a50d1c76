//! Embedded static assets.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

const STYLE_CSS: &str = include_str!("../../static/style.css");

/// Serve `/static/{*path}`; anything but the stylesheet is a 404.
pub async fn static_handler(Path(path): Path<String>) -> Response {
    match path.as_str() {
        "style.css" => (
            [
                (header::CONTENT_TYPE, "text/css; charset=utf-8"),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            STYLE_CSS,
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
    }
}
