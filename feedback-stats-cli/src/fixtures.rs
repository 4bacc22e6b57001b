use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use feedback_stats_core::{
    AnswerRecord, AnswerStream, AnswersFilter, ConfigurationRepository, FeedbackStatsError,
    Questionnaire, QuestionnaireClient, RelativeFrequencyTimeSeriesConfiguration, Result,
};

pub const CONFIGURATIONS_FILE: &str = "configurations.json";
pub const QUESTIONNAIRES_FILE: &str = "questionnaires.json";
pub const ANSWERS_FILE: &str = "answers.jsonl";

/// One line of `answers.jsonl`: an answer record plus its instance status.
#[derive(Debug, Clone, Deserialize)]
struct FixtureAnswer {
    status: String,
    #[serde(flatten)]
    record: AnswerRecord,
}

/// Configurations, questionnaires and answers read from a fixture directory.
#[derive(Debug, Default)]
pub struct FixtureSource {
    configurations: HashMap<i64, RelativeFrequencyTimeSeriesConfiguration>,
    questionnaires: HashMap<(i64, i32), Questionnaire>,
    answers: Vec<FixtureAnswer>,
}

impl FixtureSource {
    /// `answers.jsonl` is optional; the other two files are not.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let configurations: Vec<RelativeFrequencyTimeSeriesConfiguration> =
            read_json(&dir.join(CONFIGURATIONS_FILE))?;
        let questionnaires: Vec<Questionnaire> = read_json(&dir.join(QUESTIONNAIRES_FILE))?;

        let answers_path = dir.join(ANSWERS_FILE);
        let mut answers = Vec::new();
        if answers_path.exists() {
            let content = std::fs::read_to_string(&answers_path)
                .with_context(|| format!("reading {}", answers_path.display()))?;
            for (n, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let answer: FixtureAnswer = serde_json::from_str(line)
                    .with_context(|| format!("{}:{}", answers_path.display(), n + 1))?;
                answers.push(answer);
            }
        }

        Ok(Self {
            configurations: configurations.into_iter().map(|c| (c.id, c)).collect(),
            questionnaires: questionnaires
                .into_iter()
                .map(|q| ((q.id, q.version), q))
                .collect(),
            answers,
        })
    }

    pub fn configuration_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.configurations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

#[async_trait]
impl ConfigurationRepository for FixtureSource {
    async fn find_configuration(&self, id: i64) -> Result<RelativeFrequencyTimeSeriesConfiguration> {
        self.configurations
            .get(&id)
            .cloned()
            .ok_or(FeedbackStatsError::ConfigurationNotFound(id))
    }
}

#[async_trait]
impl QuestionnaireClient for FixtureSource {
    async fn get_questionnaire(&self, id: i64, version: i32) -> Result<Questionnaire> {
        self.questionnaires.get(&(id, version)).cloned().ok_or_else(|| {
            FeedbackStatsError::QuestionnaireUnavailable(format!(
                "questionnaire {id} version {version} not in fixtures"
            ))
        })
    }

    async fn get_questionnaire_answers(
        &self,
        questionnaire_id: i64,
        filter: &AnswersFilter,
    ) -> Result<AnswerStream> {
        let records: Vec<Result<AnswerRecord>> = self
            .answers
            .iter()
            .filter(|a| {
                a.record.questionnaire_id == questionnaire_id && filter.matches(&a.status, &a.record)
            })
            .map(|a| Ok(a.record.clone()))
            .collect();
        Ok(futures::stream::iter(records).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_stats_core::{
        AnswerOptionReference, IssueDatesCalculator, RelativeFrequencyTimeSeriesGenerator, ZeroNoise,
    };
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CONFIGURATIONS: &str = r##"[{
        "id": 3,
        "comparativeValues": {
            "questionnaire": {"id": 1, "version": 1},
            "answerOptionValueCodes": {"id": 1, "variableName": "exampleVariable", "valueCodes": [1, 2]}
        },
        "timeSeries": [{
            "id": 1234, "color": "#000000", "label": "value1",
            "questionnaire": {"id": 1, "version": 1},
            "answerOptionValueCodes": {"id": 1, "variableName": "exampleVariable", "valueCodes": [1]}
        }],
        "intervalShift": {"amount": 0, "unit": "hour"},
        "timeRange": {"startDate": "2022-06-01T00:00:00.000Z", "endDate": "2022-06-03T00:00:00.000Z"}
    }]"##;

    const QUESTIONNAIRES: &str = r#"[{
        "id": 1, "version": 1, "createdAt": "2022-06-01T00:00:00.000Z",
        "cycleAmount": 1, "cycleUnit": "hour", "cyclePerDay": 3, "cycleFirstHour": 8,
        "activateAfterDays": 0, "deactivateAfterDays": 2,
        "questions": [{"id": 1810, "answerOptions": [
            {"id": 1, "variableName": "exampleVariable", "values": ["value1", "value2"], "valuesCode": [1, 2]}
        ]}]
    }]"#;

    const ANSWERS: &str = concat!(
        r#"{"status": "released", "questionnaireId": 1, "questionnaireInstanceId": 1, "questionnaireInstanceDateOfIssue": "2022-06-02T08:00:00.000Z", "answerOptionId": 1, "answerOptionVariableName": "exampleVariable", "values": ["value1"]}"#,
        "\n",
        "\n",
        r#"{"status": "in_progress", "questionnaireId": 1, "questionnaireInstanceId": 2, "questionnaireInstanceDateOfIssue": "2022-06-02T06:00:00.000Z", "answerOptionId": 1, "answerOptionVariableName": "exampleVariable", "values": ["value1"]}"#,
        "\n",
    );

    fn fixture_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIGURATIONS_FILE), CONFIGURATIONS).unwrap();
        fs::write(dir.path().join(QUESTIONNAIRES_FILE), QUESTIONNAIRES).unwrap();
        fs::write(dir.path().join(ANSWERS_FILE), ANSWERS).unwrap();
        dir
    }

    fn released_filter() -> AnswersFilter {
        AnswersFilter {
            status: vec!["released".into()],
            min_date_of_issue: "2022-06-01T00:00:00Z".parse().unwrap(),
            max_date_of_issue: "2022-06-03T21:59:59.999Z".parse().unwrap(),
            answer_options: vec![AnswerOptionReference::VariableName {
                variable_name: "exampleVariable".into(),
            }],
        }
    }

    #[test]
    fn loads_all_fixture_files() {
        let dir = fixture_dir();
        let source = FixtureSource::load(dir.path()).unwrap();
        assert_eq!(source.configuration_ids(), vec![3]);
        assert!(source.questionnaires.contains_key(&(1, 1)));
        assert_eq!(source.answers.len(), 2);
    }

    #[test]
    fn answers_file_is_optional() {
        let dir = fixture_dir();
        fs::remove_file(dir.path().join(ANSWERS_FILE)).unwrap();
        let source = FixtureSource::load(dir.path()).unwrap();
        assert!(source.answers.is_empty());
    }

    #[test]
    fn malformed_answer_line_reports_position() {
        let dir = fixture_dir();
        fs::write(dir.path().join(ANSWERS_FILE), "{\"status\": 1}\n").unwrap();
        let err = FixtureSource::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("answers.jsonl:1"));
    }

    #[tokio::test]
    async fn answer_stream_applies_filter() {
        let dir = fixture_dir();
        let source = FixtureSource::load(dir.path()).unwrap();
        let answers: Vec<_> = source
            .get_questionnaire_answers(1, &released_filter())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].as_ref().unwrap().questionnaire_instance_id, 1);
    }

    #[tokio::test]
    async fn missing_entries_map_to_domain_errors() {
        let dir = fixture_dir();
        let source = FixtureSource::load(dir.path()).unwrap();
        assert!(matches!(
            source.find_configuration(9).await,
            Err(FeedbackStatsError::ConfigurationNotFound(9))
        ));
        assert!(matches!(
            source.get_questionnaire(1, 2).await,
            Err(FeedbackStatsError::QuestionnaireUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn generates_series_from_fixtures() {
        let dir = fixture_dir();
        let source = Arc::new(FixtureSource::load(dir.path()).unwrap());
        let generator = RelativeFrequencyTimeSeriesGenerator::new(
            source.clone(),
            source,
            IssueDatesCalculator::default(),
            vec!["released".into()],
        );
        let data = generator.generate_data_with(3, &mut ZeroNoise).await.unwrap();
        assert_eq!(data[0].label, "value1");
        assert_eq!(data[0].intervals.len(), 9);
        let values: Vec<u8> = data[0].intervals.iter().map(|i| i.value).collect();
        assert_eq!(values, vec![0, 0, 0, 0, 0, 100, 0, 0, 0]);
    }
}
