use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{Calendar, MAX_CALENDAR_AMOUNT};
use crate::time_range::TimeRange;
use feedback_stats_common::{FeedbackStatsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSpanUnit {
    Hour,
    Day,
    Week,
    Month,
}

/// Signed calendar duration, e.g. "-1 week".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub amount: i32,
    pub unit: TimeSpanUnit,
}

impl TimeSpan {
    pub fn new(amount: i32, unit: TimeSpanUnit) -> Self {
        Self { amount, unit }
    }

    /// Rejects amounts too large for calendar arithmetic.
    pub fn validate(&self) -> Result<Self> {
        if self.amount.unsigned_abs() > MAX_CALENDAR_AMOUNT.unsigned_abs() {
            return Err(FeedbackStatsError::Config(format!(
                "time span of {} {:?} out of range",
                self.amount, self.unit
            )));
        }
        Ok(*self)
    }

    pub fn invert(&self) -> Self {
        Self::new(-self.amount, self.unit)
    }

    pub fn shift_date(&self, date: DateTime<Utc>, calendar: &Calendar) -> DateTime<Utc> {
        let amount = i64::from(self.amount);
        match self.unit {
            TimeSpanUnit::Hour => calendar.add_hours(date, amount),
            TimeSpanUnit::Day => calendar.add_days(date, amount),
            TimeSpanUnit::Week => calendar.add_weeks(date, amount),
            TimeSpanUnit::Month => calendar.add_months(date, amount),
        }
    }

    /// Shifts both ends; an open end stays open.
    pub fn shift_time_range(&self, range: &TimeRange, calendar: &Calendar) -> TimeRange {
        TimeRange::new(
            self.shift_date(range.start_date, calendar),
            range.end_date.map(|end| self.shift_date(end, calendar)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn invert_negates_amount_only() {
        let span = TimeSpan::new(-3, TimeSpanUnit::Week);
        assert_eq!(span.invert(), TimeSpan::new(3, TimeSpanUnit::Week));
        assert_eq!(span.invert().invert(), span);
    }

    #[test]
    fn shift_dispatches_on_unit() {
        let cal = Calendar::default();
        let date = utc("2022-01-31T07:00:00Z");
        assert_eq!(TimeSpan::new(2, TimeSpanUnit::Hour).shift_date(date, &cal), utc("2022-01-31T09:00:00Z"));
        assert_eq!(TimeSpan::new(-7, TimeSpanUnit::Day).shift_date(date, &cal), utc("2022-01-24T07:00:00Z"));
        assert_eq!(TimeSpan::new(1, TimeSpanUnit::Week).shift_date(date, &cal), utc("2022-02-07T07:00:00Z"));
        assert_eq!(TimeSpan::new(1, TimeSpanUnit::Month).shift_date(date, &cal), utc("2022-02-28T07:00:00Z"));
    }

    #[test]
    fn shift_time_range_keeps_open_end() {
        let cal = Calendar::default();
        let range = TimeRange::new(utc("2022-06-01T00:00:00Z"), None);
        let shifted = TimeSpan::new(1, TimeSpanUnit::Day).shift_time_range(&range, &cal);
        assert_eq!(shifted.start_date, utc("2022-06-02T00:00:00Z"));
        assert!(shifted.end_date.is_none());
    }

    #[test]
    fn validate_bounds_amount() {
        assert!(TimeSpan::new(-MAX_CALENDAR_AMOUNT, TimeSpanUnit::Month).validate().is_ok());
        let err = TimeSpan::new(i32::MIN, TimeSpanUnit::Day).validate().unwrap_err();
        assert!(matches!(err, FeedbackStatsError::Config(_)));
    }

    #[test]
    fn deserializes_persisted_span() {
        let span: TimeSpan = serde_json::from_str(r#"{"amount": -1, "unit": "month"}"#).unwrap();
        assert_eq!(span, TimeSpan::new(-1, TimeSpanUnit::Month));
    }
}
