pub mod config;
pub use config::{AnswersConfig, Config, LogConfig, ScheduleConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedbackStatsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Unsupported cycle: {0}")]
    UnsupportedCycle(String),
    #[error("Insufficient data")]
    InsufficientData,
    #[error("No value code for value '{value}' of answer option '{variable}'")]
    UnmappedValue { variable: String, value: String },
    #[error("Questionnaire unavailable: {0}")]
    QuestionnaireUnavailable(String),
    #[error("Configuration {0} not found")]
    ConfigurationNotFound(i64),
    #[error("Answer stream failed: {0}")]
    Stream(String),
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),
}

pub type Result<T> = std::result::Result<T, FeedbackStatsError>;
