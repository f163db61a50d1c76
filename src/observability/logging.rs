//! Process logger.
//!
//! # Responsibilities
//! - Build the logging pipeline once per process: console sink, rotating
//!   JSON file sink, severity threshold, static build metadata
//! - Derive request loggers carrying a `correlation_id` scope field
//! - Route events emitted through a [`Logger`] into its own pipeline
//!
//! # Design Decisions
//! - A [`Logger`] is a `tracing` dispatcher plus a span. Deriving a request
//!   logger creates a child span; the dispatcher and sinks are shared
//! - The threshold is a per-layer filter that lets every span through, so a
//!   request span opened at INFO still scopes WARN events when `LOG_LEVEL=warn`
//! - `LOG_LEVEL` is read once. An unparsable value never fails startup; it
//!   degrades to INFO and says so on the bootstrap stream (stderr)
//! - Build metadata is attached by the JSON sink only
//!
//! # Data Flow
//! ```text
//! tracing::info!(..) inside Logger::in_scope / Logger::instrument
//!     → Dispatch (registry + per-layer threshold)
//!     → SinkMux (resolve span fields + event fields into a LogRecord)
//!     → ConsoleSink (stdout) / JsonSink (RollingFile)
//! ```

use std::fmt;
use std::future::Future;
use std::io;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::instrument::{Instrumented, WithDispatch, WithSubscriber};
use tracing::level_filters::LevelFilter;
use tracing::{dispatcher, Dispatch, Instrument, Span};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use crate::config::{FileSinkConfig, LoggingConfig};
use crate::observability::correlation::CorrelationId;
use crate::observability::sink::json::{GIT_REVISION_FIELD, RUST_VERSION_FIELD};
use crate::observability::sink::{ConsoleSink, JsonSink, RollingFile, RotationPolicy, SinkMux};

/// Environment variable holding the minimum severity.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

static PROCESS_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Initialize the process logger from configuration.
///
/// The first caller wins; later calls (and an earlier [`get`]) return the
/// logger that already exists.
pub fn init(config: &LoggingConfig) -> &'static Logger {
    PROCESS_LOGGER.get_or_init(|| Logger::from_config(config))
}

/// The process logger, built from defaults on first use if [`init`] never ran.
pub fn get() -> &'static Logger {
    PROCESS_LOGGER.get_or_init(|| Logger::from_config(&LoggingConfig::default()))
}

/// The process logger, if it has been initialized.
pub fn try_get() -> Option<&'static Logger> {
    PROCESS_LOGGER.get()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}', expected one of debug, info, warn, error")]
pub struct InvalidLevel(pub String);

/// Parse a `LOG_LEVEL` value. Case and surrounding whitespace are ignored.
pub fn parse_level(value: &str) -> Result<LevelFilter, InvalidLevel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(InvalidLevel(value.to_string())),
    }
}

/// Build metadata captured at compile time; missing values are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub git_revision: String,
    pub rust_version: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            git_revision: option_env!("GIT_REVISION").unwrap_or_default().to_string(),
            rust_version: option_env!("RUSTC_VERSION").unwrap_or_default().to_string(),
        }
    }
}

/// Handle to a logging pipeline, optionally scoped to one request.
///
/// Cloning is cheap. Two clones are the same logger for [`Logger::ptr_eq`];
/// [`Logger::for_request`] always yields a distinct one.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    dispatch: Dispatch,
    span: Span,
    correlation_id: Option<CorrelationId>,
    level: LevelFilter,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Console on stdout plus the rotating file sink, threshold from
    /// `LOG_LEVEL` (falling back to `config.level`).
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Logger::builder()
            .level_from_env_or(config.level.as_deref())
            .console_writer(io::stdout, config.console_ansi);
        if config.file.enabled {
            builder = builder.rolling_file(&config.file);
        }
        builder.build()
    }

    /// Logger that discards everything.
    pub fn nop() -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                dispatch: Dispatch::none(),
                span: Span::none(),
                correlation_id: None,
                level: LevelFilter::OFF,
            }),
        }
    }

    /// Minimum severity written by this logger.
    pub fn level(&self) -> LevelFilter {
        self.inner.level
    }

    /// Derive a logger whose records carry `correlation_id`.
    pub fn for_request(&self, id: CorrelationId) -> Self {
        let span = dispatcher::with_default(&self.inner.dispatch, || {
            tracing::info_span!(parent: &self.inner.span, "request", correlation_id = %id)
        });
        Self {
            inner: Arc::new(LoggerInner {
                dispatch: self.inner.dispatch.clone(),
                span,
                correlation_id: Some(id),
                level: self.inner.level,
            }),
        }
    }

    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.inner.correlation_id
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    pub fn span(&self) -> &Span {
        &self.inner.span
    }

    /// Whether both handles are the same logger instance.
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run `f` with this logger's pipeline and scope active.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.inner.dispatch, || self.inner.span.in_scope(f))
    }

    /// Wrap a future so every poll runs with this logger's pipeline and scope.
    pub fn instrument<F: Future>(&self, future: F) -> WithDispatch<Instrumented<F>> {
        future
            .instrument(self.inner.span.clone())
            .with_subscriber(self.inner.dispatch.clone())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.inner.level)
            .field("correlation_id", &self.inner.correlation_id)
            .finish_non_exhaustive()
    }
}

/// Threshold source, resolved at build time.
#[derive(Default)]
enum LevelSource {
    #[default]
    Unset,
    Fixed(LevelFilter),
    Raw(String),
}

/// Builder for a [`Logger`] pipeline.
pub struct LoggerBuilder {
    level: LevelSource,
    console: Option<ConsoleSink>,
    json: Option<BoxMakeWriter>,
    build_info: BuildInfo,
    bootstrap: BoxMakeWriter,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            level: LevelSource::Unset,
            console: None,
            json: None,
            build_info: BuildInfo::current(),
            bootstrap: BoxMakeWriter::new(io::stderr),
        }
    }
}

impl LoggerBuilder {
    /// Fixed threshold, bypassing `LOG_LEVEL`.
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = LevelSource::Fixed(level);
        self
    }

    /// Threshold parsed from text when the logger is built.
    pub fn level_str(mut self, raw: impl Into<String>) -> Self {
        self.level = LevelSource::Raw(raw.into());
        self
    }

    /// Threshold from `LOG_LEVEL`, or `fallback` when the variable is unset.
    pub fn level_from_env_or(mut self, fallback: Option<&str>) -> Self {
        self.level = match std::env::var(LOG_LEVEL_ENV) {
            Ok(raw) => LevelSource::Raw(raw),
            Err(_) => match fallback {
                Some(raw) => LevelSource::Raw(raw.to_string()),
                None => LevelSource::Unset,
            },
        };
        self
    }

    /// Human-readable sink.
    pub fn console_writer<W>(mut self, writer: W, ansi: bool) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.console = Some(ConsoleSink::new(writer).with_ansi(ansi));
        self
    }

    /// JSON sink writing to an arbitrary destination.
    pub fn json_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.json = Some(BoxMakeWriter::new(writer));
        self
    }

    /// JSON sink writing to a rotating file.
    pub fn rolling_file(self, config: &FileSinkConfig) -> Self {
        let file = RollingFile::new(&config.path, RotationPolicy::from(config));
        self.json_writer(file)
    }

    pub fn build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = build_info;
        self
    }

    /// Where problems found while building the logger are reported.
    pub fn bootstrap_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.bootstrap = BoxMakeWriter::new(writer);
        self
    }

    pub fn build(self) -> Logger {
        let level = match self.level {
            LevelSource::Unset => LevelFilter::INFO,
            LevelSource::Fixed(level) => level,
            LevelSource::Raw(raw) if raw.trim().is_empty() => LevelFilter::INFO,
            LevelSource::Raw(raw) => match parse_level(&raw) {
                Ok(level) => level,
                Err(e) => {
                    let bootstrap = tracing_subscriber::fmt()
                        .with_writer(self.bootstrap)
                        .with_ansi(false)
                        .finish();
                    tracing::subscriber::with_default(bootstrap, || {
                        tracing::warn!(
                            env = LOG_LEVEL_ENV,
                            value = %raw,
                            error = %e,
                            "invalid log level, defaulting to INFO"
                        );
                    });
                    LevelFilter::INFO
                }
            },
        };

        let mut mux = SinkMux::new();
        if let Some(console) = self.console {
            mux = mux.with_sink(console);
        }
        if let Some(writer) = self.json {
            mux = mux.with_sink(
                JsonSink::new(writer)
                    .with_static_field(GIT_REVISION_FIELD, self.build_info.git_revision)
                    .with_static_field(RUST_VERSION_FIELD, self.build_info.rust_version),
            );
        }

        let threshold = filter_fn(move |meta| meta.is_span() || *meta.level() <= level);
        let subscriber = tracing_subscriber::registry().with(mux.with_filter(threshold));

        Logger {
            inner: Arc::new(LoggerInner {
                dispatch: Dispatch::new(subscriber),
                span: Span::none(),
                correlation_id: None,
                level,
            }),
        }
    }
}
