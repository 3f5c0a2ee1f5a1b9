//! Structured JSON logger
//!
//! - One log line = one JSON object
//! - `event` first, then `severity`, then caller fields sorted by key
//! - Synchronous, no buffering
//! - INFO and below go to stdout, ERROR and FATAL to stderr

use std::fmt;
use std::io::{self, Write};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Refused operations, contention
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// The store cannot continue
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn uses_stderr(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless JSON-lines logger.
pub struct Logger;

impl Logger {
    /// Log a raw event name with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::format_line(severity, event, fields);
        // a failed log write must never fail the operation being logged
        let _ = if severity.uses_stderr() {
            io::stderr().lock().write_all(line.as_bytes())
        } else {
            io::stdout().lock().write_all(line.as_bytes())
        };
    }

    /// Log a typed event; severity follows the event kind.
    pub fn event(event: Event, fields: &[(&str, &str)]) {
        Self::log(Self::severity_for(event), event.as_str(), fields);
    }

    fn severity_for(event: Event) -> Severity {
        if event.is_fatal() {
            Severity::Fatal
        } else if event.is_failure() {
            Severity::Error
        } else if event == Event::BookingRejected {
            Severity::Warn
        } else {
            Severity::Info
        }
    }

    /// Renders one log line, trailing newline included.
    pub(crate) fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        let mut line = String::with_capacity(64 + fields.len() * 32);
        line.push_str("{\"event\":");
        line.push_str(&json_string(event));
        line.push_str(",\"severity\":");
        line.push_str(&json_string(severity.as_str()));

        for (key, value) in sorted {
            line.push(',');
            line.push_str(&json_string(key));
            line.push(':');
            line.push_str(&json_string(value));
        }

        line.push_str("}\n");
        line
    }
}

/// Quoted, escaped JSON string literal.
fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
        assert!(Severity::Error.uses_stderr());
        assert!(!Severity::Warn.uses_stderr());
    }

    #[test]
    fn test_line_is_json() {
        let line = Logger::format_line(Severity::Info, "RECORD_LOCKED", &[("record", "4")]);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "RECORD_LOCKED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["record"], "4");
    }

    #[test]
    fn test_fields_sorted_after_event_and_severity() {
        let a = Logger::format_line(Severity::Info, "E", &[("zebra", "1"), ("apple", "2")]);
        let b = Logger::format_line(Severity::Info, "E", &[("apple", "2"), ("zebra", "1")]);
        assert_eq!(a, b);

        let event = a.find("\"event\"").unwrap();
        let severity = a.find("\"severity\"").unwrap();
        let apple = a.find("\"apple\"").unwrap();
        let zebra = a.find("\"zebra\"").unwrap();
        assert!(event < severity && severity < apple && apple < zebra);
    }

    #[test]
    fn test_escapes_special_chars() {
        let line = Logger::format_line(Severity::Warn, "E", &[("name", "Blue \"Sky\"\nLtd")]);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["name"], "Blue \"Sky\"\nLtd");
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_event_severity_mapping() {
        assert_eq!(Logger::severity_for(Event::StoreOpenFailed), Severity::Fatal);
        assert_eq!(Logger::severity_for(Event::PersistenceFailed), Severity::Error);
        assert_eq!(Logger::severity_for(Event::BookingRejected), Severity::Warn);
        assert_eq!(Logger::severity_for(Event::RecordCreated), Severity::Info);
    }
}
