pub mod calendar;
pub mod clients;
pub mod configuration;
pub mod generator;
pub mod issue_dates;
pub mod noise;
pub mod questionnaire;
pub mod statistic;
pub mod time_range;
pub mod time_series;
pub mod time_span;
pub mod value_codes;

pub use calendar::Calendar;
pub use clients::{AnswerOptionReference, AnswerStream, AnswersFilter, ConfigurationRepository, QuestionnaireClient};
pub use configuration::{
    is_empty_data, AnswerOptionValueCodes, ComparativeValues, QuestionnaireReference,
    RelativeFrequencyTimeSeriesConfiguration, TimeSeriesData, TimeSeriesDefinition,
    TimeSeriesIntervalData,
};
pub use feedback_stats_common::{FeedbackStatsError, Result};
pub use generator::RelativeFrequencyTimeSeriesGenerator;
pub use issue_dates::IssueDatesCalculator;
pub use noise::{NoiseSource, UniformNoise, ZeroNoise};
pub use questionnaire::{
    AnswerData, AnswerOption, AnswerRecord, CycleUnit, Question, Questionnaire,
    QuestionnaireSettings, Weekday,
};
pub use statistic::{
    outcome, FeedbackStatisticData, FeedbackStatisticGenerators, FeedbackStatisticOutcome,
    FeedbackStatisticStatus, FeedbackStatisticType,
};
pub use time_range::TimeRange;
pub use time_series::RelativeFrequencyTimeSeries;
pub use time_span::{TimeSpan, TimeSpanUnit};
pub use value_codes::ValueCodesMapper;
