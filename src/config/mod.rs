//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → PORT / LOG_LEVEL environment overrides applied by the binary
//!     → handed to the logger and the HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::FileSinkConfig;
pub use schema::ListenerConfig;
pub use schema::LoggingConfig;
pub use schema::ObservabilityConfig;
pub use schema::SearchConfig;
pub use schema::TimeoutConfig;
