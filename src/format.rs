//! Event formatting for the console and file layers
//!
//! [`EventFormatter`] plugs into `tracing_subscriber`'s fmt layer and renders
//! one event per line, as human-readable text or as a JSON object. It is also
//! where caller attribution is attached: the source location captured by the
//! `tracing` macros is trimmed through [`caller::trim_location`], and the
//! optional `caller_fn` field is resolved from the stack per event.
//!
//! Formatting never fails the log call. Missing callsite metadata or an
//! unresolvable caller frame omit the field; a serialization failure renders
//! an empty line.

use crate::caller;
use crate::config::LogConfig;
use crate::timestamp::{TimestampFormat, TimestampSource};
use colored::{Color, Colorize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Field name carrying the resolved caller function.
pub const CALLER_FUNCTION_FIELD: &str = "caller_fn";

/// Encoding of a rendered log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable single-line text (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Line formatter shared by all sinks.
#[derive(Debug, Clone)]
pub struct EventFormatter {
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
    timestamp_source: TimestampSource,
    use_colors: bool,
    caller: bool,
    full_caller: bool,
    path_segments: usize,
    caller_function: bool,
    caller_skip: usize,
}

impl Default for EventFormatter {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Text,
            timestamp_format: TimestampFormat::Iso8601,
            timestamp_source: TimestampSource::Utc,
            use_colors: false,
            caller: true,
            full_caller: false,
            path_segments: 1,
            caller_function: false,
            caller_skip: caller::DEFAULT_CALLER_SKIP,
        }
    }
}

impl EventFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter for the console sink: wall-clock timestamps, colors unless
    /// disabled, always text.
    #[must_use]
    pub fn console(config: &LogConfig) -> Self {
        Self {
            output_format: OutputFormat::Text,
            timestamp_format: TimestampFormat::TimeOnly,
            use_colors: !config.no_color,
            ..Self::from_config(config)
        }
    }

    /// Formatter for the file sink and attached writers: full timestamps, no
    /// colors, JSON or text per the config.
    #[must_use]
    pub fn file(config: &LogConfig) -> Self {
        Self {
            output_format: if config.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            timestamp_format: TimestampFormat::Iso8601,
            use_colors: false,
            ..Self::from_config(config)
        }
    }

    fn from_config(config: &LogConfig) -> Self {
        Self {
            timestamp_source: config.timestamp,
            caller: config.caller,
            full_caller: config.full_caller,
            path_segments: config.path_segments,
            caller_function: config.caller_function,
            caller_skip: config.caller_skip,
            ..Self::default()
        }
    }

    /// Set the output encoding
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the timestamp layout
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Set the timestamp clock
    #[must_use]
    pub fn with_timestamp_source(mut self, source: TimestampSource) -> Self {
        self.timestamp_source = source;
        self
    }

    /// Enable or disable ANSI colors
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Rendered source location for an event, honoring the trim settings.
    fn render_location(&self, meta: &Metadata<'_>) -> Option<String> {
        if !self.caller {
            return None;
        }
        let file = meta.file()?;
        let line = meta.line()?;
        if self.full_caller {
            Some(format!("{file}:{line}"))
        } else {
            Some(caller::trim_location(file, line, self.path_segments))
        }
    }

    /// Resolved caller function for an event, when enabled.
    fn render_caller_function(&self) -> Option<String> {
        if !self.caller_function {
            return None;
        }
        caller::resolve_caller(self.caller_skip).map(|resolved| {
            if self.full_caller {
                resolved.function.clone()
            } else {
                resolved.short_function().to_string()
            }
        })
    }

    fn write_text(
        &self,
        writer: &mut Writer<'_>,
        meta: &Metadata<'_>,
        visitor: &FieldVisitor,
        location: Option<&str>,
        caller_fn: Option<&str>,
    ) -> fmt::Result {
        let timestamp = self.timestamp_format.render(self.timestamp_source);
        let level = format!("{:5}", level_str(meta.level()));
        if self.use_colors {
            write!(
                writer,
                "{} {}",
                timestamp,
                level.color(level_color(meta.level()))
            )?;
        } else {
            write!(writer, "{} {}", timestamp, level)?;
        }

        if let Some(location) = location {
            if self.use_colors {
                write!(writer, " {}", location.color(Color::Green).bold())?;
            } else {
                write!(writer, " {}", location)?;
            }
        }

        if let Some(message) = &visitor.message {
            write!(writer, " {}", message)?;
        }
        for (key, value) in &visitor.fields {
            write!(writer, " {}={}", key, render_text_value(value))?;
        }
        if let Some(caller_fn) = caller_fn {
            write!(writer, " {}={}", CALLER_FUNCTION_FIELD, caller_fn)?;
        }
        writeln!(writer)
    }

    fn write_json(
        &self,
        writer: &mut Writer<'_>,
        meta: &Metadata<'_>,
        visitor: FieldVisitor,
        location: Option<String>,
        caller_fn: Option<String>,
    ) -> fmt::Result {
        let mut object = Map::new();
        object.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp_format.render(self.timestamp_source)),
        );
        object.insert(
            "level".to_string(),
            Value::String(level_str(meta.level()).to_string()),
        );
        object.insert(
            "target".to_string(),
            Value::String(meta.target().to_string()),
        );
        if let Some(message) = visitor.message {
            object.insert("message".to_string(), Value::String(message));
        }
        for (key, value) in visitor.fields {
            object.insert(key, value);
        }
        if let Some(location) = location {
            object.insert("caller".to_string(), Value::String(location));
        }
        if let Some(caller_fn) = caller_fn {
            object.insert(CALLER_FUNCTION_FIELD.to_string(), Value::String(caller_fn));
        }

        let line = serde_json::to_string(&Value::Object(object)).unwrap_or_default();
        writeln!(writer, "{}", line)
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for EventFormatter
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
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let location = self.render_location(meta);
        let caller_fn = self.render_caller_function();

        match self.output_format {
            OutputFormat::Text => self.write_text(
                &mut writer,
                meta,
                &visitor,
                location.as_deref(),
                caller_fn.as_deref(),
            ),
            OutputFormat::Json => self.write_json(&mut writer, meta, visitor, location, caller_fn),
        }
    }
}

/// Collects an event's fields, separating the message from the rest.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        match serde_json::Number::from_f64(value) {
            Some(number) => self.push(field, Value::Number(number)),
            None => self.push(field, Value::String(value.to_string())),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::String(value.to_string()));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::String(format!("{:?}", value)));
        }
    }
}

fn level_str(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "ERROR",
    }
}

fn level_color(level: &Level) -> Color {
    match *level {
        Level::TRACE => Color::BrightBlack,
        Level::DEBUG => Color::Blue,
        Level::INFO => Color::Green,
        Level::WARN => Color::Yellow,
        Level::ERROR => Color::Red,
    }
}

/// Render a field value for text output, quoting strings that would be
/// ambiguous unquoted.
fn render_text_value(value: &Value) -> String {
    match value {
        Value::String(s) if !s.contains(' ') && !s.contains('"') && !s.contains('=') => s.clone(),
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
