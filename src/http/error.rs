//! Handler error type and its HTTP mapping.

use std::num::ParseIntError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::observability::context;
use crate::search::SearchError;

/// Errors a request handler can fail with.
///
/// Every variant maps to a plain `500 Internal Server Error`; the detail only
/// goes to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid page number '{value}'")]
    InvalidPage {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("search failed")]
    Search(#[from] SearchError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        context::current().in_scope(|| {
            tracing::error!(
                error = &self as &(dyn std::error::Error + 'static),
                "request failed"
            );
        });
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
