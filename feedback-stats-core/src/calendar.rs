use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::questionnaire::Weekday;

/// Largest day, hour, week or month count accepted from stored metadata.
/// Keeps every sum of two such amounts inside chrono's representable range.
pub const MAX_CALENDAR_AMOUNT: i32 = 1_000_000;

/// Local-time calendar arithmetic in one fixed time zone.
///
/// Day, week and month additions keep the local wall-clock time; hour
/// additions are fixed durations. Local times skipped by a DST transition
/// resolve one hour later, ambiguous ones to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn add_hours(&self, date: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
        date + Duration::hours(hours)
    }

    pub fn add_days(&self, date: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        let local = self.naive_local(date);
        self.resolve(local + Duration::days(days))
    }

    pub fn add_weeks(&self, date: DateTime<Utc>, weeks: i64) -> DateTime<Utc> {
        self.add_days(date, weeks * 7)
    }

    /// Calendar month addition; the day is clamped to the last day of the target month.
    pub fn add_months(&self, date: DateTime<Utc>, months: i64) -> DateTime<Utc> {
        let local = self.naive_local(date);
        let magnitude = Months::new(months.unsigned_abs().min(u64::from(u32::MAX)) as u32);
        let shifted = if months >= 0 {
            local.checked_add_months(magnitude)
        } else {
            local.checked_sub_months(magnitude)
        };
        match shifted {
            Some(naive) => self.resolve(naive),
            None => date,
        }
    }

    pub fn start_of_day(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.naive_local(date);
        self.resolve(local.date().and_time(NaiveTime::MIN))
    }

    /// 23:59:59.999 local time on the same day.
    pub fn end_of_day(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(self.add_days(self.start_of_day(date), 1)) - Duration::milliseconds(1)
    }

    /// 23:59:59.000 local time on the same day.
    pub fn last_second_of_day(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(self.add_days(self.start_of_day(date), 1)) - Duration::seconds(1)
    }

    pub fn day_of_month(&self, date: DateTime<Utc>) -> u32 {
        date.with_timezone(&self.tz).day()
    }

    pub fn hour(&self, date: DateTime<Utc>) -> u32 {
        date.with_timezone(&self.tz).hour()
    }

    /// First occurrence of `weekday` on or after `date`, keeping the time of day.
    pub fn next_weekday(&self, date: DateTime<Utc>, weekday: Weekday) -> DateTime<Utc> {
        let current = i64::from(date.with_timezone(&self.tz).weekday().num_days_from_sunday());
        let target = i64::from(weekday.num_days_from_sunday());
        let candidate = self.add_days(date, target - current);
        if candidate < date {
            self.add_weeks(candidate, 1)
        } else {
            candidate
        }
    }

    fn naive_local(&self, date: DateTime<Utc>) -> NaiveDateTime {
        date.with_timezone(&self.tz).naive_local()
    }

    fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        let local = match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => self
                .tz
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .unwrap_or_else(|| self.tz.from_utc_datetime(&naive)),
        };
        local.with_timezone(&Utc)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Berlin)
    }
}
