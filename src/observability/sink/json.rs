//! Structured JSON sink, one object per line.

use std::io::{self, Write};

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use super::{LogRecord, Sink};

/// Build revision of the running binary.
pub const GIT_REVISION_FIELD: &str = "git_revision";
/// Compiler version the binary was built with.
pub const RUST_VERSION_FIELD: &str = "rust_version";

/// Writes records as JSON lines, appending a fixed set of static fields.
///
/// Layout: `timestamp`, `level`, `message`, `target`, record fields, static
/// fields. Record fields never overwrite the envelope keys.
pub struct JsonSink {
    writer: BoxMakeWriter,
    static_fields: Map<String, Value>,
}

impl JsonSink {
    pub fn new<W>(writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            writer: BoxMakeWriter::new(writer),
            static_fields: Map::new(),
        }
    }

    /// Attach a field to every record written by this sink.
    pub fn with_static_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.static_fields.insert(key.into(), value.into());
        self
    }

    /// Render a record as a newline-terminated JSON object.
    pub fn format(&self, record: &LogRecord) -> Result<String, serde_json::Error> {
        let mut object = Map::new();
        object.insert(
            "timestamp".into(),
            Value::String(record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        object.insert(
            "level".into(),
            Value::String(record.level.as_str().to_ascii_lowercase()),
        );
        object.insert("message".into(), Value::String(record.message.clone()));
        object.insert("target".into(), Value::String(record.target.clone()));

        let extra = record.fields.iter().chain(self.static_fields.iter());
        for (key, value) in extra {
            if !object.contains_key(key) {
                object.insert(key.clone(), value.clone());
            }
        }

        let mut line = serde_json::to_string(&Value::Object(object))?;
        line.push('\n');
        Ok(line)
    }
}

impl Sink for JsonSink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        let line = self.format(record)?;
        let mut writer = self.writer.make_writer();
        writer.write_all(line.as_bytes())
    }
}
