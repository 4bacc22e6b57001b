use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::MAX_CALENDAR_AMOUNT;
use crate::time_span::TimeSpanUnit;
use feedback_stats_common::{FeedbackStatsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleUnit {
    Once,
    Hour,
    Day,
    Week,
    Month,
    Spontan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub fn num_days_from_sunday(self) -> u32 {
        match self {
            Weekday::Sunday => 0,
            Weekday::Monday => 1,
            Weekday::Tuesday => 2,
            Weekday::Wednesday => 3,
            Weekday::Thursday => 4,
            Weekday::Friday => 5,
            Weekday::Saturday => 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: i64,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub values_code: Option<Vec<i32>>, // free-text options carry no codes
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub answer_options: Vec<AnswerOption>,
}

/// Questionnaire metadata as delivered by the questionnaire service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: i64,
    pub version: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cycle_amount: Option<i32>,
    #[serde(default)]
    pub cycle_unit: Option<CycleUnit>,
    #[serde(default)]
    pub cycle_per_day: Option<i32>,
    #[serde(default)]
    pub cycle_first_hour: Option<i32>,
    #[serde(default)]
    pub activate_after_days: i32,
    #[serde(default)]
    pub deactivate_after_days: i32,
    #[serde(default)]
    pub notification_weekday: Option<Weekday>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Recurrence parameters the issue-date reconstruction works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSettings {
    pub id: i64,
    pub cycle_amount: Option<i32>,
    pub cycle_unit: Option<CycleUnit>,
    pub cycle_per_day: Option<i32>,
    pub cycle_first_hour: Option<i32>,
    pub activate_after_days: i32,
    pub deactivate_after_days: i32,
    pub notification_weekday: Option<Weekday>,
    pub created_at: Option<DateTime<Utc>>,
}

impl QuestionnaireSettings {
    /// Validated cycle: a positive amount of a recurring unit.
    pub fn cycle(&self) -> Result<(i32, TimeSpanUnit)> {
        let unit = match self.cycle_unit {
            Some(CycleUnit::Hour) => TimeSpanUnit::Hour,
            Some(CycleUnit::Day) => TimeSpanUnit::Day,
            Some(CycleUnit::Week) => TimeSpanUnit::Week,
            Some(CycleUnit::Month) => TimeSpanUnit::Month,
            Some(other) => {
                return Err(FeedbackStatsError::UnsupportedCycle(format!(
                    "questionnaire {} has non-recurring cycle unit {other:?}",
                    self.id
                )))
            }
            None => {
                return Err(FeedbackStatsError::UnsupportedCycle(format!(
                    "questionnaire {} has no cycle unit",
                    self.id
                )))
            }
        };
        let amount = match self.cycle_amount {
            Some(amount) if amount > 0 && amount <= MAX_CALENDAR_AMOUNT => amount,
            amount => {
                return Err(FeedbackStatsError::UnsupportedCycle(format!(
                    "questionnaire {} has cycle amount {amount:?}",
                    self.id
                )))
            }
        };
        for (name, value) in [
            ("activateAfterDays", Some(self.activate_after_days)),
            ("deactivateAfterDays", Some(self.deactivate_after_days)),
            ("cycleFirstHour", self.cycle_first_hour),
        ] {
            if value.is_some_and(|v| v.unsigned_abs() > MAX_CALENDAR_AMOUNT.unsigned_abs()) {
                return Err(FeedbackStatsError::UnsupportedCycle(format!(
                    "questionnaire {} has {name} {value:?} out of range",
                    self.id
                )));
            }
        }
        Ok((amount, unit))
    }
}

impl From<&Questionnaire> for QuestionnaireSettings {
    fn from(q: &Questionnaire) -> Self {
        Self {
            id: q.id,
            cycle_amount: q.cycle_amount,
            cycle_unit: q.cycle_unit,
            cycle_per_day: q.cycle_per_day,
            cycle_first_hour: q.cycle_first_hour,
            activate_after_days: q.activate_after_days,
            deactivate_after_days: q.deactivate_after_days,
            notification_weekday: q.notification_weekday,
            created_at: q.created_at,
        }
    }
}

/// Raw answer as streamed by the questionnaire service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub questionnaire_id: i64,
    pub questionnaire_instance_id: i64,
    pub questionnaire_instance_date_of_issue: DateTime<Utc>,
    pub answer_option_id: i64,
    #[serde(default)]
    pub answer_option_variable_name: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// An answer whose values have been translated to value codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerData {
    pub questionnaire_id: i64,
    pub questionnaire_instance_id: i64,
    pub questionnaire_instance_date_of_issue: DateTime<Utc>,
    pub answer_option_id: i64,
    pub value_codes: Vec<i32>,
}

impl AnswerData {
    pub fn from_record(record: AnswerRecord, value_codes: Vec<i32>) -> Self {
        Self {
            questionnaire_id: record.questionnaire_id,
            questionnaire_instance_id: record.questionnaire_instance_id,
            questionnaire_instance_date_of_issue: record.questionnaire_instance_date_of_issue,
            answer_option_id: record.answer_option_id,
            value_codes,
        }
    }
}
