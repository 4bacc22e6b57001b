use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::clients::{AnswerOptionReference, AnswersFilter, ConfigurationRepository, QuestionnaireClient};
use crate::configuration::{
    is_empty_data, AnswerOptionValueCodes, RelativeFrequencyTimeSeriesConfiguration, TimeSeriesData,
};
use crate::issue_dates::IssueDatesCalculator;
use crate::noise::{NoiseSource, UniformNoise};
use crate::questionnaire::{AnswerData, Questionnaire, QuestionnaireSettings};
use crate::time_series::RelativeFrequencyTimeSeries;
use crate::value_codes::ValueCodesMapper;
use feedback_stats_common::{Config, FeedbackStatsError, Result};

/// Computes the relative frequency time series of one stored configuration.
///
/// Each call owns its own accumulator, so one generator may serve any number
/// of concurrent generations.
pub struct RelativeFrequencyTimeSeriesGenerator {
    configurations: Arc<dyn ConfigurationRepository>,
    questionnaires: Arc<dyn QuestionnaireClient>,
    calculator: IssueDatesCalculator,
    released_statuses: Vec<String>,
}

impl RelativeFrequencyTimeSeriesGenerator {
    pub fn new(
        configurations: Arc<dyn ConfigurationRepository>,
        questionnaires: Arc<dyn QuestionnaireClient>,
        calculator: IssueDatesCalculator,
        released_statuses: Vec<String>,
    ) -> Self {
        Self {
            configurations,
            questionnaires,
            calculator,
            released_statuses,
        }
    }

    pub fn from_config(
        config: &Config,
        configurations: Arc<dyn ConfigurationRepository>,
        questionnaires: Arc<dyn QuestionnaireClient>,
    ) -> Result<Self> {
        Ok(Self::new(
            configurations,
            questionnaires,
            IssueDatesCalculator::from_config(&config.schedule)?,
            config.answers.released_statuses.clone(),
        ))
    }

    pub async fn generate_data(&self, configuration_id: i64) -> Result<Vec<TimeSeriesData>> {
        let mut noise = UniformNoise::from_entropy();
        self.generate_data_with(configuration_id, &mut noise).await
    }

    /// Fails with `InsufficientData` if every reported value is zero.
    pub async fn generate_data_with(
        &self,
        configuration_id: i64,
        noise: &mut (dyn NoiseSource + Send),
    ) -> Result<Vec<TimeSeriesData>> {
        let now = Utc::now();
        let config = self.configurations.find_configuration(configuration_id).await?;
        let reference = config.comparative_values.questionnaire;
        let questionnaire = self
            .questionnaires
            .get_questionnaire(reference.id, reference.version)
            .await?;

        let mapper = ValueCodesMapper::new(&questionnaire.questions);
        let mut settings = QuestionnaireSettings::from(&questionnaire);
        settings.created_at = self.first_version_created_at(&questionnaire).await;

        let mut time_series =
            RelativeFrequencyTimeSeries::new(&config, &settings, &self.calculator, now)?;

        let filter = self.answers_filter(&config, now);
        let mut answers = self
            .questionnaires
            .get_questionnaire_answers(reference.id, &filter)
            .await?;
        let mut pushed = 0usize;
        while let Some(record) = answers.next().await {
            let record = record?;
            let codes = mapper.map(
                record.answer_option_variable_name.as_deref(),
                record.answer_option_id,
                &record.values,
            )?;
            let Some(codes) = codes else {
                debug!(
                    answer_option = record.answer_option_id,
                    "skipping answer of unknown answer option"
                );
                continue;
            };
            if time_series.push_answer(&AnswerData::from_record(record, codes)) {
                pushed += 1;
            }
        }

        let data = time_series.get_data(noise);
        if is_empty_data(&data) {
            info!(configuration = configuration_id, answers = pushed, "insufficient data");
            return Err(FeedbackStatsError::InsufficientData);
        }
        info!(
            configuration = configuration_id,
            answers = pushed,
            intervals = time_series.interval_count(),
            "generated relative frequency time series"
        );
        Ok(data)
    }

    /// Schedule anchor: creation date of version 1, falling back to the
    /// given version's own date if version 1 cannot be fetched.
    async fn first_version_created_at(&self, questionnaire: &Questionnaire) -> Option<DateTime<Utc>> {
        if questionnaire.version <= 1 {
            return questionnaire.created_at;
        }
        match self.questionnaires.get_questionnaire(questionnaire.id, 1).await {
            Ok(first) => first.created_at,
            Err(e) => {
                error!(
                    questionnaire = questionnaire.id,
                    error = %e,
                    "first version of questionnaire could not be retrieved, using createdAt of version {}",
                    questionnaire.version
                );
                questionnaire.created_at
            }
        }
    }

    /// Released answers whose issue date can land in any interval.
    fn answers_filter(
        &self,
        config: &RelativeFrequencyTimeSeriesConfiguration,
        now: DateTime<Utc>,
    ) -> AnswersFilter {
        let calendar = self.calculator.calendar();
        let back = config.interval_shift.invert();
        let end_of_range = calendar.end_of_day(config.time_range.end_or(now));

        let answer_options = std::iter::once(&config.comparative_values.answer_option_value_codes)
            .chain(config.time_series.iter().map(|s| &s.answer_option_value_codes))
            .map(option_reference)
            .collect();

        AnswersFilter {
            status: self.released_statuses.clone(),
            min_date_of_issue: back.shift_date(config.time_range.start_date, calendar),
            max_date_of_issue: back.shift_date(end_of_range, calendar),
            answer_options,
        }
    }
}

fn option_reference(codes: &AnswerOptionValueCodes) -> AnswerOptionReference {
    match codes.variable_name.as_deref() {
        Some(name) if !name.is_empty() => AnswerOptionReference::VariableName {
            variable_name: name.to_string(),
        },
        _ => AnswerOptionReference::Id { id: codes.id },
    }
}
