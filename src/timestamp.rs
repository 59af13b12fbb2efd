//! Timestamp source and formatting
//!
//! The timestamp source is process-wide configuration: chosen once at
//! initialization and applied to every sink. Formats follow the original wire
//! conventions of the sinks being wired: ISO 8601 with milliseconds for
//! file/JSON output and a bare `%H:%M:%S` clock for the console.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Clock used when stamping log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// Coordinated universal time (default).
    #[default]
    Utc,
    /// The host's local timezone.
    Local,
}

impl TimestampSource {
    /// Render the current time with the given strftime pattern.
    #[must_use]
    pub fn format_now(&self, pattern: &str) -> String {
        match self {
            TimestampSource::Utc => Utc::now().format(pattern).to_string(),
            TimestampSource::Local => Local::now().format(pattern).to_string(),
        }
    }
}

/// Timestamp layout for rendered log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    ///
    /// The default for file and JSON output. Local timestamps carry a numeric
    /// offset instead of the `Z` suffix.
    #[default]
    Iso8601,

    /// Wall-clock time only: `10:30:45`
    ///
    /// Used by the console sink for display compactness.
    TimeOnly,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Render the current time from `source` in this format.
    #[must_use]
    pub fn render(&self, source: TimestampSource) -> String {
        match self {
            TimestampFormat::Iso8601 => match source {
                TimestampSource::Utc => source.format_now("%Y-%m-%dT%H:%M:%S%.3fZ"),
                TimestampSource::Local => source.format_now("%Y-%m-%dT%H:%M:%S%.3f%z"),
            },
            TimestampFormat::TimeOnly => source.format_now("%H:%M:%S"),
            TimestampFormat::Custom(pattern) => source.format_now(pattern),
        }
    }

    /// Format a fixed UTC instant in this layout.
    #[must_use]
    pub fn format_utc(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::TimeOnly => datetime.format("%H:%M:%S").to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimestampFormat::Iso8601.format_utc(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_time_only_format() {
        let result = TimestampFormat::TimeOnly.format_utc(&fixed_datetime());
        assert_eq!(result, "10:30:45");
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(format.format_utc(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_default_source_is_utc() {
        assert_eq!(TimestampSource::default(), TimestampSource::Utc);
    }

    #[test]
    fn test_render_utc_has_zulu_suffix() {
        let rendered = TimestampFormat::Iso8601.render(TimestampSource::Utc);
        assert!(rendered.ends_with('Z'), "got: {rendered}");
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&TimestampSource::Local).expect("serialize");
        assert_eq!(json, "\"local\"");

        let source: TimestampSource = serde_json::from_str("\"utc\"").expect("deserialize");
        assert_eq!(source, TimestampSource::Utc);
    }
}
