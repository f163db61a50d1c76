//! Log record model shared by every sink.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::Level;

/// A single log event, resolved against the scopes it was emitted in.
///
/// Scope fields (e.g. `correlation_id` from the request span) come first,
/// outermost scope first, followed by the event's own fields.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// Create a record stamped with the current time and no fields.
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
            fields: Map::new(),
        }
    }

    /// Add a structured field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Fields recorded on a span, stored in the registry's span extensions.
#[derive(Debug, Default, Clone)]
pub(crate) struct ScopeFields(pub(crate) Map<String, Value>);

/// Visitor that turns `tracing` fields into JSON values.
///
/// The `message` field is kept apart so sinks can place it themselves.
#[derive(Debug, Default)]
pub(crate) struct FieldCollector {
    pub(crate) message: Option<String>,
    pub(crate) fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.insert(field, Value::String(rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON representation
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let mut rendered = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        self.insert(field, Value::String(rendered));
    }
}
