use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::configuration::RelativeFrequencyTimeSeriesConfiguration;
use crate::questionnaire::{AnswerRecord, Questionnaire};
use feedback_stats_common::Result;

/// Answers in arbitrary order; an `Err` item aborts consumption.
pub type AnswerStream = BoxStream<'static, Result<AnswerRecord>>;

/// Store of the statistic configurations.
#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    async fn find_configuration(&self, id: i64) -> Result<RelativeFrequencyTimeSeriesConfiguration>;
}

/// The questionnaire service, seen from this crate.
#[async_trait]
pub trait QuestionnaireClient: Send + Sync {
    async fn get_questionnaire(&self, id: i64, version: i32) -> Result<Questionnaire>;

    async fn get_questionnaire_answers(
        &self,
        questionnaire_id: i64,
        filter: &AnswersFilter,
    ) -> Result<AnswerStream>;
}

/// Refers to an answer option by its stable variable name, or by id when it has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerOptionReference {
    VariableName {
        #[serde(rename = "variableName")]
        variable_name: String,
    },
    Id {
        id: i64,
    },
}

impl AnswerOptionReference {
    pub fn matches(&self, record: &AnswerRecord) -> bool {
        match self {
            Self::VariableName { variable_name } => {
                record.answer_option_variable_name.as_deref() == Some(variable_name.as_str())
            }
            Self::Id { id } => record.answer_option_id == *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersFilter {
    pub status: Vec<String>,
    pub min_date_of_issue: DateTime<Utc>,
    pub max_date_of_issue: DateTime<Utc>,
    pub answer_options: Vec<AnswerOptionReference>,
}

impl AnswersFilter {
    /// Both date bounds are inclusive.
    pub fn matches(&self, status: &str, record: &AnswerRecord) -> bool {
        let date = record.questionnaire_instance_date_of_issue;
        self.status.iter().any(|s| s == status)
            && date >= self.min_date_of_issue
            && date <= self.max_date_of_issue
            && self.answer_options.iter().any(|o| o.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(option: i64, variable: Option<&str>, date: &str) -> AnswerRecord {
        AnswerRecord {
            questionnaire_id: 5,
            questionnaire_instance_id: 1,
            questionnaire_instance_date_of_issue: date.parse().unwrap(),
            answer_option_id: option,
            answer_option_variable_name: variable.map(str::to_string),
            values: vec!["one".into()],
        }
    }

    fn filter() -> AnswersFilter {
        AnswersFilter {
            status: vec!["released".into(), "released_once".into()],
            min_date_of_issue: "2022-06-01T00:00:00Z".parse().unwrap(),
            max_date_of_issue: "2022-06-30T23:59:59.999Z".parse().unwrap(),
            answer_options: vec![
                AnswerOptionReference::VariableName {
                    variable_name: "mood".into(),
                },
                AnswerOptionReference::Id { id: 1810 },
            ],
        }
    }

    #[test]
    fn filter_checks_status_window_and_options() {
        let f = filter();
        assert!(f.matches("released", &record(1, Some("mood"), "2022-06-01T00:00:00Z")));
        assert!(f.matches("released_once", &record(1810, None, "2022-06-30T12:00:00Z")));
        assert!(!f.matches("in_progress", &record(1810, None, "2022-06-10T00:00:00Z")));
        assert!(!f.matches("released", &record(1810, None, "2022-07-01T00:00:00Z")));
        assert!(!f.matches("released", &record(2, Some("sleep"), "2022-06-10T00:00:00Z")));
    }

    #[test]
    fn option_references_serialize_as_single_key_objects() {
        let json = serde_json::to_value(filter()).unwrap();
        assert_eq!(json["answerOptions"][0], serde_json::json!({"variableName": "mood"}));
        assert_eq!(json["answerOptions"][1], serde_json::json!({"id": 1810}));
        assert_eq!(json["minDateOfIssue"], "2022-06-01T00:00:00Z");
    }
}
