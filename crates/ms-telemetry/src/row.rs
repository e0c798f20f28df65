//! One flattened sample.

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp as ISO-8601 UTC with millisecond precision and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// An ordered, timestamped projection of one status snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    timestamp: DateTime<Utc>,
    values: Vec<String>,
}

impl Row {
    pub fn new(timestamp: DateTime<Utc>, values: Vec<String>) -> Self {
        Self { timestamp, values }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Cell values in schema column order, excluding the timestamp.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Full CSV record: the formatted timestamp followed by every value.
    pub fn record(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(format_timestamp(&self.timestamp)).chain(self.values.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_has_millis_and_z() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-01T00:00:00.000Z");

        let ts = ts + chrono::Duration::microseconds(123_456);
        assert_eq!(format_timestamp(&ts), "2024-01-01T00:00:00.123Z");
    }

    #[test]
    fn record_prefixes_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let row = Row::new(ts, vec!["100".into(), "200".into()]);
        let record: Vec<String> = row.record().collect();
        assert_eq!(record, vec!["2024-01-01T00:00:00.000Z", "100", "200"]);
    }
}
