//! Request middleware, outermost first: correlation, then status capture.

pub mod correlation;
pub mod status;

pub use correlation::{correlation_middleware, X_CORRELATION_ID};
pub use status::{capture_status, StatusCapture};
