//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     logging::init(config) → process Logger (sinks, threshold, build info)
//!
//! Per request (http::middleware::correlation):
//!     CorrelationId::new()
//!     → Logger::for_request (child span with correlation_id)
//!     → context::attach (request extensions) + context::scope (task-local)
//!     → handlers / search client: context::current() or the Logger extractor
//!
//! Every event:
//!     → sink::SinkMux → console line (stdout) + JSON line (rotating file)
//!     → metrics.rs (request counters and latency, optional Prometheus)
//! ```
//!
//! # Design Decisions
//! - One process-wide pipeline; request loggers are cheap derived views
//! - Sinks are best-effort; a broken sink never fails a request
//! - Code without access to the request still logs with its correlation ID

pub mod context;
pub mod correlation;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use correlation::CorrelationId;
pub use logging::Logger;
