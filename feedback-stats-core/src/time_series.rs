use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::calendar::Calendar;
use crate::configuration::{
    is_empty_data, AnswerOptionValueCodes, RelativeFrequencyTimeSeriesConfiguration,
    TimeSeriesData, TimeSeriesDefinition, TimeSeriesIntervalData,
};
use crate::issue_dates::IssueDatesCalculator;
use crate::noise::NoiseSource;
use crate::questionnaire::{AnswerData, QuestionnaireSettings};
use crate::time_range::TimeRange;
use crate::time_span::TimeSpan;
use feedback_stats_common::Result;

const MIN_VALUE: f64 = 0.0;
const MAX_VALUE: f64 = 100.0;
const MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone)]
struct Bucket {
    time_range: TimeRange,
    answers: u32,
    denominator: u32,
    numerators: Vec<u32>, // one per series
}

/// Bins answers into the intervals of a questionnaire's schedule and reports
/// the jittered share of numerator hits per interval and series.
///
/// Intervals are seeded once at construction from the reconstructed issue
/// dates; only intervals lying strictly inside the configured time range are
/// kept. Answers outside every seeded interval are dropped.
#[derive(Debug, Clone)]
pub struct RelativeFrequencyTimeSeries {
    comparative: AnswerOptionValueCodes,
    series: Vec<TimeSeriesDefinition>,
    interval_length: TimeSpan,
    interval_shift: TimeSpan,
    calendar: Calendar,
    buckets: Vec<Bucket>,
    index: HashMap<String, usize>,
}

impl RelativeFrequencyTimeSeries {
    /// `settings.created_at` must already be the anchor of the first
    /// questionnaire version; `now` closes an open time range.
    pub fn new(
        config: &RelativeFrequencyTimeSeriesConfiguration,
        settings: &QuestionnaireSettings,
        calculator: &IssueDatesCalculator,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let (amount, unit) = settings.cycle()?;
        let calendar = *calculator.calendar();
        let mut time_series = Self {
            comparative: config.comparative_values.answer_option_value_codes.clone(),
            series: config.time_series.clone(),
            interval_length: TimeSpan::new(amount, unit),
            interval_shift: config.interval_shift.validate()?,
            calendar,
            buckets: Vec::new(),
            index: HashMap::new(),
        };

        let start_date = config.time_range.start_date;
        let end_date = calendar.end_of_day(config.time_range.end_or(now));
        for date_of_issue in calculator.issue_dates(settings, now)? {
            let interval = time_series.interval_for(date_of_issue);
            let Some(interval_end) = interval.end_date else { continue };
            if interval.start_date <= start_date || interval_end >= end_date {
                continue;
            }
            let key = interval.to_iso_string();
            if time_series.index.contains_key(&key) {
                continue;
            }
            time_series.index.insert(key, time_series.buckets.len());
            time_series.buckets.push(Bucket {
                time_range: interval,
                answers: 0,
                denominator: 0,
                numerators: vec![0; time_series.series.len()],
            });
        }
        debug!(
            configuration = config.id,
            intervals = time_series.buckets.len(),
            "seeded time series intervals"
        );
        Ok(time_series)
    }

    /// Shifted interval an instance issued at `date_of_issue` belongs to.
    pub fn interval_for(&self, date_of_issue: DateTime<Utc>) -> TimeRange {
        let start = self.interval_shift.shift_date(date_of_issue, &self.calendar);
        TimeRange::closed(start, self.interval_length.shift_date(start, &self.calendar))
    }

    /// Bins one answer; returns false if it falls outside every interval.
    pub fn push_answer(&mut self, answer: &AnswerData) -> bool {
        let key = self
            .interval_for(answer.questionnaire_instance_date_of_issue)
            .to_iso_string();
        let Some(&i) = self.index.get(&key) else {
            warn!(interval = %key, "answer for interval out of time series range");
            return false;
        };
        let bucket = &mut self.buckets[i];
        bucket.answers += 1;
        if self
            .comparative
            .matches(answer.answer_option_id, &answer.value_codes)
        {
            bucket.denominator += 1;
        }
        for (count, series) in bucket.numerators.iter_mut().zip(&self.series) {
            if series
                .answer_option_value_codes
                .matches(answer.answer_option_id, &answer.value_codes)
            {
                *count += 1;
            }
        }
        true
    }

    pub fn intervals(&self) -> impl Iterator<Item = &TimeRange> + '_ {
        self.buckets.iter().map(|b| &b.time_range)
    }

    pub fn interval_count(&self) -> usize {
        self.buckets.len()
    }

    /// One snapshot of every series, in seeding order.
    pub fn get_data(&self, noise: &mut dyn NoiseSource) -> Vec<TimeSeriesData> {
        self.series
            .iter()
            .enumerate()
            .map(|(s, series)| TimeSeriesData {
                color: series.color.clone(),
                label: series.label.clone(),
                intervals: self
                    .buckets
                    .iter()
                    .map(|bucket| TimeSeriesIntervalData {
                        time_range: bucket.time_range,
                        value: if bucket.answers == 0 {
                            0
                        } else {
                            relative_frequency(
                                bucket.numerators[s],
                                bucket.denominator,
                                noise.offset(),
                            )
                        },
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn is_empty(&self, noise: &mut dyn NoiseSource) -> bool {
        is_empty_data(&self.get_data(noise))
    }
}

/// Percentage plus jitter, rounded and clamped to 0..=100. A zero
/// denominator yields 0 for no hits and 100 otherwise.
fn relative_frequency(numerator: u32, denominator: u32, offset: f64) -> u8 {
    let share = f64::from(numerator) / f64::from(denominator) * MULTIPLIER;
    let share = if share.is_nan() { 0.0 } else { share };
    (share + offset).round().clamp(MIN_VALUE, MAX_VALUE) as u8
}
