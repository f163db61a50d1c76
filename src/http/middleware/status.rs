//! Response status capture.
//!
//! The correlation middleware needs the final status code for its access
//! log, including statuses produced by layers between it and the handler
//! (timeouts). This middleware sits just inside it and records the status of
//! whatever the rest of the stack returns.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

/// Shared cell holding the status written for one request.
#[derive(Debug, Clone)]
pub struct StatusCapture(Arc<AtomicU16>);

impl StatusCapture {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU16::new(0)))
    }

    pub fn record(&self, status: StatusCode) {
        self.0.store(status.as_u16(), Ordering::Relaxed);
    }

    /// The recorded status, or 200 if nothing was written.
    pub fn captured_status(&self) -> StatusCode {
        match self.0.load(Ordering::Relaxed) {
            0 => StatusCode::OK,
            code => StatusCode::from_u16(code).unwrap_or(StatusCode::OK),
        }
    }
}

impl Default for StatusCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Record the downstream response status into the request's [`StatusCapture`].
pub async fn capture_status(request: Request, next: Next) -> Response {
    let capture = request.extensions().get::<StatusCapture>().cloned();
    let response = next.run(request).await;
    if let Some(capture) = capture {
        capture.record(response.status());
    }
    response
}
