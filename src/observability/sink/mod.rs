//! Log sink multiplexer.
//!
//! # Responsibilities
//! - Resolve each `tracing` event into a [`LogRecord`] once
//! - Fan the record out to every configured [`Sink`]
//! - Keep a failing sink from affecting the others
//!
//! # Design Decisions
//! - The multiplexer is a `tracing_subscriber` layer; severity filtering is
//!   applied outside of it as a per-layer filter
//! - Span fields are captured on span creation so request-scoped fields
//!   (correlation ID) reach every event emitted inside the span
//! - Sink write errors are swallowed: logging is best-effort and never
//!   surfaces into request handling

pub mod console;
pub mod json;
pub mod record;
pub mod rolling;

use std::io;

use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub use console::ConsoleSink;
pub use json::JsonSink;
pub use record::LogRecord;
pub use rolling::{RollingFile, RotationPolicy};

use record::{FieldCollector, ScopeFields};

/// A log destination with its own format and field filter.
pub trait Sink: Send + Sync {
    /// Format and write a single record.
    fn write(&self, record: &LogRecord) -> io::Result<()>;
}

/// Fans every record out to a fixed set of sinks.
#[derive(Default)]
pub struct SinkMux {
    sinks: Vec<Box<dyn Sink>>,
}

impl SinkMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a destination.
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of configured destinations.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Write the record to every sink, ignoring individual failures.
    pub fn write(&self, record: &LogRecord) {
        for sink in &self.sinks {
            let _ = sink.write(record);
        }
    }
}

impl<S> Layer<S> for SinkMux
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut collector = FieldCollector::default();
        attrs.record(&mut collector);
        span.extensions_mut().insert(ScopeFields(collector.fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut collector = FieldCollector::default();
        values.record(&mut collector);
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<ScopeFields>() {
            Some(scope) => scope.0.extend(collector.fields),
            None => extensions.insert(ScopeFields(collector.fields)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut record = LogRecord::new(*metadata.level(), metadata.target(), String::new());

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<ScopeFields>() {
                    record
                        .fields
                        .extend(fields.0.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        record.message = collector.message.unwrap_or_default();
        record.fields.extend(collector.fields);

        self.write(&record);
    }
}
