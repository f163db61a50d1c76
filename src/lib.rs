//! Search front-end library.
//!
//! A small web front-end for the MediaWiki search API, built around a
//! request-scoped structured-logging pipeline: every request gets a
//! correlation ID that appears on all of its log records and in the
//! `X-Correlation-ID` response header.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod search;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{CorrelationId, Logger};
