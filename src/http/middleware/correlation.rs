//! Correlation ID middleware.
//!
//! # Responsibilities
//! - Give every request a fresh [`CorrelationId`]
//! - Derive the request logger and make it reachable from handlers
//! - Echo the ID in `X-Correlation-ID`
//! - Emit one access-log record per completed request
//!
//! # Design Decisions
//! - Outermost layer, so timeouts and 404s are access-logged too
//! - An incoming `X-Correlation-ID` is not trusted; the header is replaced
//! - A request future dropped before completion logs nothing

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::middleware::status::StatusCapture;
use crate::observability::{context, metrics, CorrelationId, Logger};

/// Response header carrying the correlation ID.
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

pub async fn correlation_middleware(
    State(logger): State<Logger>,
    request: Request,
    next: Next,
) -> Response {
    // 1. Derive the request logger and attach it
    let id = CorrelationId::new();
    let request_logger = logger.for_request(id);
    let mut request = context::attach(request, request_logger.clone());

    // 2. Fresh status capture for the interceptor
    let capture = StatusCapture::new();
    request.extensions_mut().insert(capture.clone());

    let method = request.method().clone();
    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let user_agent = header_str(request.headers(), &USER_AGENT);
    let referrer = header_str(request.headers(), &REFERER);
    let start = Instant::now();

    // 3. Run the rest of the stack with the request logger in scope
    let downstream = request_logger.instrument(next.run(request));
    let mut response = context::scope(request_logger.clone(), downstream).await;

    // 4. Echo the ID
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(X_CORRELATION_ID, value);
    }

    // 5. Access log
    let elapsed = start.elapsed();
    let status = capture.captured_status();
    request_logger.in_scope(|| {
        tracing::info!(
            method = %method,
            url = %url,
            user_agent = %user_agent,
            referrer = %referrer,
            status_code = status.as_u16(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "{} request to {} completed",
            method,
            url
        );
    });
    metrics::record_request(method.as_str(), status.as_u16(), elapsed);

    response
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
