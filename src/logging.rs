//! JSON log lines in the shape Google Cloud Logging ingests from stdout.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Cloud Logging source location key
const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";

/// One JSON object per event with `severity`, `message`, source location and the event's fields
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudLoggingFormat;

/// Cloud Logging severity name for a tracing level
pub fn severity(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG | Level::TRACE => "DEBUG",
    }
}

impl<S, N> FormatEvent<S, N> for CloudLoggingFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let mut entry = Map::new();
        entry.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        entry.insert("severity".to_string(), Value::String(severity(meta.level()).to_string()));
        entry.insert(
            "message".to_string(),
            fields.values.remove("message").unwrap_or(Value::String(String::new())),
        );
        entry.insert("target".to_string(), Value::String(meta.target().to_string()));
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            entry.insert(
                SOURCE_LOCATION_KEY.to_string(),
                json!({
                    "file": file,
                    // Cloud Logging expects the line as a string
                    "line": line.to_string(),
                    "function": meta.module_path().unwrap_or_default(),
                }),
            );
        }
        for (key, value) in fields.values {
            entry.entry(key).or_insert(value);
        }

        let line = serde_json::to_string(&entry).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

#[derive(Default)]
struct FieldCollector {
    values: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        self.values.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, json!(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}
