//! Search front-end binary.
//!
//! # Startup
//! ```text
//! CLI (--config, PORT)
//!     → load config (fatal on error, reported through the process logger)
//!     → init process logger (LOG_LEVEL, console + rotating JSON file)
//!     → metrics endpoint (optional)
//!     → bind listener → serve until SIGINT/SIGTERM → drain
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use search_frontend::config::{load_config, AppConfig};
use search_frontend::lifecycle::{wait_for_signal, Shutdown};
use search_frontend::observability::{logging, metrics, Logger};
use search_frontend::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "search-frontend", version, about = "Wikipedia search front-end")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured bind address.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 1. Configuration
    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                logging::get().in_scope(|| {
                    tracing::error!(
                        path = %path.display(),
                        error = &e as &(dyn Error + 'static),
                        "Failed to load configuration"
                    );
                });
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.set_port(port);
    }

    // 2. Process logger, also the global dispatcher for library events
    let logger = logging::init(&config.logging);
    if tracing::dispatcher::set_global_default(logger.dispatch().clone()).is_err() {
        logger.in_scope(|| tracing::warn!("Global tracing dispatcher was already set"));
    }

    // 3. Serve
    match run(config, logger).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.in_scope(|| {
                tracing::error!(error = e.as_ref() as &(dyn Error + 'static), "Fatal error");
            });
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig, logger: &'static Logger) -> Result<(), Box<dyn Error>> {
    logger.in_scope(|| {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            bind_address = %config.listener.bind_address,
            search_endpoint = %config.search.endpoint,
            log_level = %logger.level(),
            "search-frontend starting"
        );
    });

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(&config, logger.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, signal).await?;

    logger.in_scope(|| tracing::info!("Shutdown complete"));
    Ok(())
}
