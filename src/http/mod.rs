//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → middleware/correlation.rs (correlation ID, request logger, access log)
//!     → middleware/status.rs (record response status)
//!     → request timeout
//!     → handlers.rs / assets.rs
//!         → search client → views.rs (HTML)
//!         → error.rs (handler failure → ERROR record + 500)
//! ```

pub mod assets;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod views;

pub use error::AppError;
pub use middleware::X_CORRELATION_ID;
pub use server::{AppState, HttpServer, ServerError};
