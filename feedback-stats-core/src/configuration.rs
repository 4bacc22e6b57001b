use serde::{Deserialize, Serialize};

use crate::time_range::TimeRange;
use crate::time_span::TimeSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireReference {
    pub id: i64,
    pub version: i32,
}

/// Which answer option to look at and which of its value codes count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOptionValueCodes {
    pub id: i64,
    #[serde(default)]
    pub variable_name: Option<String>,
    pub value_codes: Vec<i32>,
}

impl AnswerOptionValueCodes {
    /// True if the answer belongs to this option and carries any of its codes.
    pub fn matches(&self, answer_option_id: i64, value_codes: &[i32]) -> bool {
        answer_option_id == self.id && self.value_codes.iter().any(|c| value_codes.contains(c))
    }
}

/// Denominator shared by every series of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeValues {
    pub questionnaire: QuestionnaireReference,
    pub answer_option_value_codes: AnswerOptionValueCodes,
}

/// One plotted series; its option/codes form the numerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesDefinition {
    pub id: i64,
    pub color: String,
    pub label: String,
    pub questionnaire: QuestionnaireReference,
    pub answer_option_value_codes: AnswerOptionValueCodes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeFrequencyTimeSeriesConfiguration {
    pub id: i64,
    #[serde(default)]
    pub study: String,
    pub comparative_values: ComparativeValues,
    pub time_series: Vec<TimeSeriesDefinition>,
    pub interval_shift: TimeSpan,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesIntervalData {
    pub time_range: TimeRange,
    pub value: u8, // 0..=100
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesData {
    pub color: String,
    pub label: String,
    pub intervals: Vec<TimeSeriesIntervalData>,
}

/// True iff every interval of every series is exactly zero.
pub fn is_empty_data(data: &[TimeSeriesData]) -> bool {
    data.iter()
        .all(|series| series.intervals.iter().all(|interval| interval.value == 0))
}
