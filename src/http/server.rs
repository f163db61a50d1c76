//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (correlation, status capture, timeout)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::io;
use std::time::Duration;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use crate::config::AppConfig;
use crate::http::assets::static_handler;
use crate::http::handlers::{index_handler, search_handler};
use crate::http::middleware::{capture_status, correlation_middleware};
use crate::observability::Logger;
use crate::search::{SearchClient, SearchError};

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build search client")]
    SearchClient(#[from] SearchError),

    #[error("server I/O error")]
    Io(#[from] io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
    pub search: SearchClient,
    pub page_size: u32,
}

/// HTTP server for the search front-end.
pub struct HttpServer {
    router: Router,
    logger: Logger,
}

impl HttpServer {
    /// Create a new HTTP server. `logger` is the base every request logger
    /// derives from.
    pub fn new(config: &AppConfig, logger: Logger) -> Result<Self, ServerError> {
        let state = AppState {
            logger: logger.clone(),
            search: SearchClient::new(&config.search)?,
            page_size: config.search.page_size,
        };

        let router = Self::build_router(config, state);
        Ok(Self { router, logger })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let logger = state.logger.clone();
        Router::new()
            .route("/", any(index_handler))
            .route("/search", get(search_handler))
            .route("/static/{*path}", get(static_handler))
            .fallback(index_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(capture_status))
            .layer(middleware::from_fn_with_state(logger, correlation_middleware))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        self.logger.in_scope(|| {
            tracing::info!(address = %addr, "HTTP server starting");
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        self.logger.in_scope(|| tracing::info!("HTTP server stopped"));
        Ok(())
    }
}
