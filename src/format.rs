//! Access-log line rendering.
//!
//! One record, one line:
//!
//! ```text
//! [tether] 2024/05/01 - 13:37:00 | random-uuid | 200 |       1.203ms |     203.0.113.7 | GET     /users/42 | {}
//! ```
//!
//! Columns are padded for people reading a terminal. The line is free text,
//! not a structured encoding; nothing should parse it by column offsets.

use std::time::Duration;

use chrono::{DateTime, Local};

/// Tag used when the host supplies none.
pub const DEFAULT_TAG: &str = "tether";

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d - %H:%M:%S";

/// The facts behind one access-log line. Built per request, rendered, dropped.
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub event_time: DateTime<Local>,
    pub correlation_id: String,
    pub status: String,
    pub latency: Duration,
    pub client_address: String,
    pub operation: String,
    pub body: String,
}

/// How records are rendered. Only the tag varies between hosts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFormat {
    tag: String,
}

impl LogFormat {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Renders `record` as a single newline-terminated line.
    pub fn render(&self, record: &LogRecord) -> String {
        format!(
            "[{}] {} | {:>5} | {:>3} | {:>13} | {:>15} | {} | {}\n",
            self.tag,
            record.event_time.format(TIMESTAMP_FORMAT),
            record.correlation_id,
            record.status,
            format_latency(record.latency),
            record.client_address,
            record.operation,
            record.body,
        )
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

/// `GET     /path?query`: the method left-aligned in seven columns.
pub fn http_operation(method: &str, path_and_query: &str) -> String {
    format!("{method:<7} {path_and_query}")
}

/// Human units with up to three decimals: `850ns`, `35.2µs`, `1.203ms`, `2.5s`.
///
/// The unit is chosen after rounding, so `999.9996ms` renders as `1s`.
pub fn format_latency(latency: Duration) -> String {
    let nanos = latency.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }

    let units = [(1e3, "µs"), (1e6, "ms"), (1e9, "s")];
    let mut rendered = (0.0, "s");
    for (scale, unit) in units {
        let value = (nanos as f64 / scale * 1e3).round() / 1e3;
        rendered = (value, unit);
        if value < 1e3 {
            break;
        }
    }

    let (value, unit) = rendered;
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}{unit}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        LogRecord {
            event_time: Local.with_ymd_and_hms(2024, 5, 1, 13, 37, 0).unwrap(),
            correlation_id: "random-uuid".to_owned(),
            status: "200".to_owned(),
            latency: Duration::from_micros(1203),
            client_address: "203.0.113.7".to_owned(),
            operation: http_operation("GET", "/users/42"),
            body: "{}".to_owned(),
        }
    }

    #[test]
    fn renders_one_padded_line() {
        let line = LogFormat::default().render(&record());
        assert_eq!(
            line,
            "[tether] 2024/05/01 - 13:37:00 | random-uuid | 200 |       1.203ms |     203.0.113.7 | GET     /users/42 | {}\n",
        );
    }

    #[test]
    fn short_columns_are_right_aligned() {
        let mut rec = record();
        rec.correlation_id = String::new();
        rec.client_address = "-".to_owned();
        let line = LogFormat::new("svc").render(&rec);
        assert!(line.starts_with("[svc] 2024/05/01 - 13:37:00 |       | 200 |"));
        assert!(line.contains("|               - |"));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn latency_units() {
        assert_eq!(format_latency(Duration::from_nanos(850)), "850ns");
        assert_eq!(format_latency(Duration::from_nanos(35_200)), "35.2µs");
        assert_eq!(format_latency(Duration::from_millis(12)), "12ms");
        assert_eq!(format_latency(Duration::from_millis(2500)), "2.5s");
    }

    #[test]
    fn latency_rounding_carries_into_next_unit() {
        assert_eq!(format_latency(Duration::from_nanos(999_999)), "999.999µs");
        assert_eq!(format_latency(Duration::from_nanos(9_999_998)), "10ms");
        assert_eq!(format_latency(Duration::from_nanos(999_999_800)), "1s");
        assert_eq!(format_latency(Duration::from_nanos(999_999_999)), "1s");
    }

    #[test]
    fn operation_pads_method() {
        assert_eq!(http_operation("GET", "/random"), "GET     /random");
        assert_eq!(http_operation("OPTIONS", "/"), "OPTIONS /");
    }
}
