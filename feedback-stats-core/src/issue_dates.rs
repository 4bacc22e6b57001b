use chrono::{DateTime, Duration, Utc};

use crate::calendar::Calendar;
use crate::questionnaire::QuestionnaireSettings;
use crate::time_span::TimeSpanUnit;
use feedback_stats_common::{Result, ScheduleConfig};

const HOURS_PER_DAY: i32 = 24;

/// Reconstructs the dates on which questionnaire instances were issued.
///
/// Mirrors the instance generation of the questionnaire service, so that
/// bucket boundaries line up with the real instances without reading them.
#[derive(Debug, Clone)]
pub struct IssueDatesCalculator {
    calendar: Calendar,
    notification_offset: Duration,
}

impl IssueDatesCalculator {
    pub fn new(calendar: Calendar, notification_offset: Duration) -> Self {
        Self {
            calendar,
            notification_offset,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self::new(
            Calendar::new(config.tz()?),
            config.notification_offset()?,
        ))
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Issue dates in generation order; `now` stands in for a missing `created_at`.
    pub fn issue_dates(
        &self,
        settings: &QuestionnaireSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let (cycle_amount, unit) = settings.cycle()?;
        let cal = &self.calendar;
        let cycle_amount = i64::from(cycle_amount);
        let cycle_first_hour = settings.cycle_first_hour.unwrap_or(0);
        let cycle_per_day = settings.cycle_per_day.unwrap_or(HOURS_PER_DAY);
        let offset_days = i64::from(settings.activate_after_days);
        let duration_days = i64::from(settings.deactivate_after_days);

        let midnight = cal.start_of_day(settings.created_at.unwrap_or(now));
        let start = match unit {
            TimeSpanUnit::Hour => cal.add_hours(midnight, i64::from(cycle_first_hour)),
            _ => midnight + self.notification_offset,
        };
        let max = cal.last_second_of_day(cal.add_days(start, offset_days + duration_days));

        let mut dates = Vec::new();
        if unit == TimeSpanUnit::Month {
            let offset_date = cal.add_days(start, offset_days);
            let mut current = offset_date;
            let mut i = 0;
            while current < max {
                dates.push(match settings.notification_weekday {
                    Some(weekday) => cal.next_weekday(current, weekday),
                    None => current,
                });
                i += 1;
                current = cal.add_months(offset_date, cycle_amount * i);
            }
            return Ok(dates);
        }

        // hour cycles count instances per day, with the day boundary moved
        // back by a negative first hour
        let day_shift = if cycle_first_hour < 0 {
            i64::from(-cycle_first_hour)
        } else {
            0
        };
        let mut dates_on_current_day = 0;
        let mut last: Option<DateTime<Utc>> = None;
        let mut current = cal.add_days(start, offset_days);
        while current <= max {
            if unit == TimeSpanUnit::Hour {
                let current_day = cal.day_of_month(cal.add_hours(current, day_shift));
                let same_day = last
                    .map(|l| cal.day_of_month(cal.add_hours(l, day_shift)) == current_day)
                    .unwrap_or(true);
                if same_day {
                    dates_on_current_day += 1;
                } else {
                    dates_on_current_day = 1;
                }
            }
            dates.push(match (unit, settings.notification_weekday) {
                (TimeSpanUnit::Week, Some(weekday)) => cal.next_weekday(current, weekday),
                _ => current,
            });
            last = Some(current);
            current = match unit {
                TimeSpanUnit::Hour => self.next_hourly(
                    current,
                    cycle_amount,
                    cycle_first_hour,
                    dates_on_current_day >= cycle_per_day,
                ),
                TimeSpanUnit::Day => cal.add_days(current, cycle_amount),
                _ => cal.add_weeks(current, cycle_amount),
            };
        }
        Ok(dates)
    }

    fn next_hourly(
        &self,
        date: DateTime<Utc>,
        hours: i64,
        cycle_first_hour: i32,
        day_limit_reached: bool,
    ) -> DateTime<Utc> {
        let cal = &self.calendar;
        let next = if day_limit_reached {
            cal.add_days(date, 1)
        } else {
            cal.add_hours(date, hours)
        };
        // on a new day restart at the first hour, unless a negative first
        // hour already put us there
        let day_changed = cal.day_of_month(date) != cal.day_of_month(next);
        let already_at_first_hour =
            HOURS_PER_DAY - cal.hour(date) as i32 == -cycle_first_hour;
        if day_changed && (cycle_first_hour > 0 || !already_at_first_hour) {
            cal.add_hours(cal.start_of_day(next), i64::from(cycle_first_hour))
        } else {
            next
        }
    }
}

impl Default for IssueDatesCalculator {
    fn default() -> Self {
        Self::new(Calendar::default(), Duration::hours(8))
    }
}
