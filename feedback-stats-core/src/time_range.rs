use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use feedback_stats_common::{FeedbackStatsError, Result};

/// Half-open range `[start, end)`; an absent end means "until now".
///
/// The ISO serialization (`start` or `start/end`, millisecond precision) is
/// used as bucket key, and two ranges are equal iff their serializations are.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis::option", default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start_date: DateTime<Utc>, end_date: Option<DateTime<Utc>>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn closed(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self::new(start_date, Some(end_date))
    }

    pub fn to_iso_string(&self) -> String {
        match self.end_date {
            Some(end) => format!("{}/{}", to_iso(self.start_date), to_iso(end)),
            None => to_iso(self.start_date),
        }
    }

    pub fn from_iso_string(s: &str) -> Result<Self> {
        let (start, end) = match s.split_once('/') {
            Some((start, end)) => (start, Some(end)),
            None => (s, None),
        };
        let start_date = parse_iso(start)?;
        let end_date = end.map(parse_iso).transpose()?;
        Ok(Self::new(start_date, end_date))
    }

    /// End date, or `now` for an open range.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end_date.unwrap_or(now)
    }
}

impl PartialEq for TimeRange {
    fn eq(&self, other: &Self) -> bool {
        self.to_iso_string() == other.to_iso_string()
    }
}

impl Eq for TimeRange {}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

fn to_iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_iso(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| FeedbackStatsError::InvalidTimeRange(format!("'{s}': {e}")))
}

// JS-style `toISOString()` output: always millisecond precision, `Z` suffix.
mod iso_millis {
    use super::to_iso;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_iso(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }

    pub mod option {
        use super::super::to_iso;
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => serializer.serialize_some(&to_iso(*d)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(deserializer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn iso_string_round_trips() {
        let closed = TimeRange::closed(utc("2022-06-01T07:00:00Z"), utc("2022-06-01T09:00:00Z"));
        assert_eq!(closed.to_iso_string(), "2022-06-01T07:00:00.000Z/2022-06-01T09:00:00.000Z");
        let parsed = TimeRange::from_iso_string(&closed.to_iso_string()).unwrap();
        assert_eq!(parsed.to_iso_string(), closed.to_iso_string());

        let open = TimeRange::new(utc("2022-12-03T00:00:00.250Z"), None);
        assert_eq!(open.to_iso_string(), "2022-12-03T00:00:00.250Z");
        let parsed = TimeRange::from_iso_string(&open.to_iso_string()).unwrap();
        assert_eq!(parsed, open);
        assert!(parsed.end_date.is_none());
    }

    #[test]
    fn rejects_malformed_key() {
        let err = TimeRange::from_iso_string("2022-06-01/yesterday").unwrap_err();
        assert!(matches!(err, FeedbackStatsError::InvalidTimeRange(_)));
    }

    #[test]
    fn serializes_as_dto() {
        let range = TimeRange::closed(utc("2022-12-31T07:00:00Z"), utc("2023-01-01T07:00:00Z"));
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["startDate"], "2022-12-31T07:00:00.000Z");
        assert_eq!(json["endDate"], "2023-01-01T07:00:00.000Z");

        let open: TimeRange = serde_json::from_str(r#"{"startDate": "2022-12-03T00:00:00Z"}"#).unwrap();
        assert!(open.end_date.is_none());
        assert_eq!(serde_json::to_value(open).unwrap()["endDate"], serde_json::Value::Null);
    }
}
