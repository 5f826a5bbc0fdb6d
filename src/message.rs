//! The record moved through a pipeline

use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Timestamp display formats, with and without a microsecond fraction
const DISPLAY_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const DISPLAY_TS_FORMAT_FRAC: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// A single (key, value, timestamp) record
///
/// Messages are immutable once built; equality compares all three fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    key: String,
    value: f64,
    timestamp: DateTime<FixedOffset>,
}

impl Message {
    pub fn new(key: impl Into<String>, value: f64, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        &self.timestamp
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts_format = match self.timestamp.timestamp_subsec_nanos() {
            0 => DISPLAY_TS_FORMAT,
            _ => DISPLAY_TS_FORMAT_FRAC,
        };
        // `{:?}` keeps the trailing ".0" on whole numbers
        write!(
            f,
            "Key: {}, Value: {:?}, Timestamp: {}",
            self.key,
            self.value,
            self.timestamp.format(ts_format)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_display() {
        let msg = Message::new("A1", 1.0, ts("2024-01-01T00:00:00Z"));
        assert_eq!(
            msg.to_string(),
            "Key: A1, Value: 1.0, Timestamp: 2024-01-01 00:00:00+00:00"
        );

        let msg = Message::new("Q123", 42.7, ts("2024-06-30T12:30:15.250+02:00"));
        assert_eq!(
            msg.to_string(),
            "Key: Q123, Value: 42.7, Timestamp: 2024-06-30 12:30:15.250000+02:00"
        );
    }

    #[test]
    fn test_display_fraction_is_always_six_digits() {
        let msg = Message::new("C3", 3.0, ts("2024-06-30T12:30:15.123456789+02:00"));
        assert_eq!(
            msg.to_string(),
            "Key: C3, Value: 3.0, Timestamp: 2024-06-30 12:30:15.123456+02:00"
        );

        let msg = Message::new("D4", 4.0, ts("2024-06-30T12:30:15.000001-05:30"));
        assert_eq!(
            msg.to_string(),
            "Key: D4, Value: 4.0, Timestamp: 2024-06-30 12:30:15.000001-05:30"
        );
    }

    #[test]
    fn test_equality_is_by_value() {
        let a = Message::new("B2", 2.5, ts("2024-01-01T00:01:00Z"));
        let b = Message::new(String::from("B2"), 2.5, ts("2024-01-01T00:01:00Z"));
        assert_eq!(a, b);

        let c = Message::new("B2", 2.6, ts("2024-01-01T00:01:00Z"));
        assert_ne!(a, c);
    }
}
