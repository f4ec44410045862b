//! Inclusive timeframe filter for analysis requests.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// `[start, end]` window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timeframe {
    /// Create a validated timeframe.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ModelResult<Self> {
        let tf = Self { start, end };
        tf.validate()?;
        Ok(tf)
    }

    /// Parse ISO-8601 / RFC 3339 bounds (`Z` suffix or explicit offset).
    pub fn parse(start: &str, end: &str) -> ModelResult<Self> {
        let start = parse_instant(start)?;
        let end = parse_instant(end)?;
        Self::new(start, end)
    }

    /// Reject windows whose start is after their end.
    pub fn validate(&self) -> ModelResult<()> {
        if self.start > self.end {
            return Err(ModelError::invalid_timeframe(format!(
                "start {} is after end {}",
                self.start.to_rfc3339(),
                self.end.to_rfc3339()
            )));
        }
        Ok(())
    }

    /// Whether `at` lies within the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn parse_instant(s: &str) -> ModelResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModelError::invalid_timeframe(format!("'{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_and_contains_is_inclusive() {
        let tf = Timeframe::parse("2025-05-04T08:00:00Z", "2025-05-04T09:00:00Z").unwrap();
        assert!(tf.contains(tf.start));
        assert!(tf.contains(tf.end));
        assert!(tf.contains(tf.start + Duration::minutes(30)));
        assert!(!tf.contains(tf.start - Duration::seconds(1)));
        assert!(!tf.contains(tf.end + Duration::seconds(1)));
    }

    #[test]
    fn test_parse_with_offset() {
        let tf = Timeframe::parse("2025-05-04T10:00:00+02:00", "2025-05-04T11:00:00+02:00").unwrap();
        assert_eq!(tf.start.to_rfc3339(), "2025-05-04T08:00:00+00:00");
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let result = Timeframe::parse("2025-05-04T09:00:00Z", "2025-05-04T08:00:00Z");
        assert!(matches!(result, Err(ModelError::InvalidTimeframe(_))));
    }

    #[test]
    fn test_malformed_bound_is_rejected() {
        assert!(Timeframe::parse("yesterday", "2025-05-04T08:00:00Z").is_err());
    }
}
