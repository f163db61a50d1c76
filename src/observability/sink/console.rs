//! Human-readable console sink.

use std::io::{self, Write};

use chrono::Local;
use colored::Colorize;
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use super::json::{GIT_REVISION_FIELD, RUST_VERSION_FIELD};
use super::{LogRecord, Sink};

/// Fields that are useful in the JSON file but clutter a terminal.
pub const CONSOLE_EXCLUDED_FIELDS: &[&str] = &["user_agent", GIT_REVISION_FIELD, RUST_VERSION_FIELD];

/// Writes one line per record: `<time> <LEVEL> <message> <field=value ...>`.
pub struct ConsoleSink {
    writer: BoxMakeWriter,
    ansi: bool,
}

impl ConsoleSink {
    /// Console sink writing to stdout with colors.
    pub fn stdout() -> Self {
        Self::new(io::stdout)
    }

    pub fn new<W>(writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            writer: BoxMakeWriter::new(writer),
            ansi: true,
        }
    }

    /// Enable or disable ANSI colors on the level.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Render a record as a single newline-terminated line.
    pub fn format(&self, record: &LogRecord) -> String {
        let mut line = format!(
            "{} {} {}",
            record
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%dT%H:%M:%S%.3f%z"),
            self.level(record.level),
            record.message,
        );

        for (key, value) in &record.fields {
            if CONSOLE_EXCLUDED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&render_value(value));
        }

        line.push('\n');
        line
    }

    fn level(&self, level: Level) -> String {
        let label = format!("{:<5}", level.as_str());
        if !self.ansi {
            return label;
        }
        match level {
            Level::ERROR => label.red().to_string(),
            Level::WARN => label.yellow().to_string(),
            Level::INFO => label.green().to_string(),
            Level::DEBUG => label.blue().to_string(),
            _ => label.magenta().to_string(),
        }
    }
}

impl Sink for ConsoleSink {
    fn write(&self, record: &LogRecord) -> io::Result<()> {
        let line = self.format(record);
        let mut writer = self.writer.make_writer();
        writer.write_all(line.as_bytes())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() || s.contains(char::is_whitespace) || s.contains('"') => {
            format!("{:?}", s)
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
