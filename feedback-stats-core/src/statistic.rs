use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::configuration::TimeSeriesData;
use crate::generator::RelativeFrequencyTimeSeriesGenerator;
use feedback_stats_common::FeedbackStatsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatisticType {
    RelativeFrequencyTimeSeries,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackStatisticData {
    RelativeFrequencyTimeSeries(Vec<TimeSeriesData>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatisticStatus {
    HasData,
    InsufficientData,
    Error,
}

/// Result of one generation as the caller persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackStatisticOutcome {
    pub configuration_id: i64,
    #[serde(rename = "type")]
    pub kind: FeedbackStatisticType,
    pub status: FeedbackStatisticStatus,
    pub data: Option<FeedbackStatisticData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dispatches a generation request to the generator of its statistic type.
#[derive(Clone)]
pub struct FeedbackStatisticGenerators {
    relative_frequency_time_series: Arc<RelativeFrequencyTimeSeriesGenerator>,
}

impl FeedbackStatisticGenerators {
    pub fn new(relative_frequency_time_series: Arc<RelativeFrequencyTimeSeriesGenerator>) -> Self {
        Self {
            relative_frequency_time_series,
        }
    }

    /// Never fails; errors are folded into the outcome's status.
    pub async fn generate(
        &self,
        kind: FeedbackStatisticType,
        configuration_id: i64,
    ) -> FeedbackStatisticOutcome {
        let result = match kind {
            FeedbackStatisticType::RelativeFrequencyTimeSeries => self
                .relative_frequency_time_series
                .generate_data(configuration_id)
                .await
                .map(FeedbackStatisticData::RelativeFrequencyTimeSeries),
        };
        outcome(kind, configuration_id, result)
    }
}

pub fn outcome(
    kind: FeedbackStatisticType,
    configuration_id: i64,
    result: feedback_stats_common::Result<FeedbackStatisticData>,
) -> FeedbackStatisticOutcome {
    let (status, data, error) = match result {
        Ok(data) => (FeedbackStatisticStatus::HasData, Some(data), None),
        Err(FeedbackStatsError::InsufficientData) => {
            (FeedbackStatisticStatus::InsufficientData, None, None)
        }
        Err(e) => {
            warn!(configuration = configuration_id, error = %e, "feedback statistic generation failed");
            (FeedbackStatisticStatus::Error, None, Some(e.to_string()))
        }
    };
    FeedbackStatisticOutcome {
        configuration_id,
        kind,
        status,
        data,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_fold_into_status() {
        let kind = FeedbackStatisticType::RelativeFrequencyTimeSeries;
        let ok = outcome(kind, 1, Ok(FeedbackStatisticData::RelativeFrequencyTimeSeries(vec![])));
        assert_eq!(ok.status, FeedbackStatisticStatus::HasData);
        assert!(ok.data.is_some());

        let insufficient = outcome(kind, 2, Err(FeedbackStatsError::InsufficientData));
        assert_eq!(insufficient.status, FeedbackStatisticStatus::InsufficientData);
        assert!(insufficient.error.is_none());

        let failed = outcome(kind, 3, Err(FeedbackStatsError::ConfigurationNotFound(3)));
        assert_eq!(failed.status, FeedbackStatisticStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("Configuration 3 not found"));
    }

    #[test]
    fn outcome_serializes_with_snake_case_tags() {
        let outcome = outcome(
            FeedbackStatisticType::RelativeFrequencyTimeSeries,
            4,
            Err(FeedbackStatsError::InsufficientData),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "relative_frequency_time_series");
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["data"], serde_json::Value::Null);
        assert!(json.get("error").is_none());
    }
}
