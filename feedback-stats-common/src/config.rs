use chrono::{Duration, NaiveTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::FeedbackStatsError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_notification_time")]
    pub notification_time: String, // HH:MM, local time
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_notification_time() -> String {
    "08:00".into()
}
fn default_timezone() -> String {
    "Europe/Berlin".into()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            notification_time: default_notification_time(),
            timezone: default_timezone(),
        }
    }
}

impl ScheduleConfig {
    /// Offset from local midnight at which non-hourly instances are issued.
    pub fn notification_offset(&self) -> crate::Result<Duration> {
        let time = NaiveTime::parse_from_str(&self.notification_time, "%H:%M").map_err(|e| {
            FeedbackStatsError::Config(format!(
                "invalid notification_time '{}': {e}",
                self.notification_time
            ))
        })?;
        Ok(Duration::hours(i64::from(time.hour())) + Duration::minutes(i64::from(time.minute())))
    }

    pub fn tz(&self) -> crate::Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            FeedbackStatsError::Config(format!("invalid timezone '{}': {e}", self.timezone))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswersConfig {
    #[serde(default = "default_released_statuses")]
    pub released_statuses: Vec<String>,
}

fn default_released_statuses() -> Vec<String> {
    vec![
        "released".into(),
        "released_once".into(),
        "released_twice".into(),
    ]
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            released_statuses: default_released_statuses(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub answers: AnswersConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feedback-stats")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        let path = if let Ok(env_path) = std::env::var("FEEDBACK_STATS_CONFIG") {
            PathBuf::from(env_path) // $FEEDBACK_STATS_CONFIG overrides default config path
        } else {
            Self::config_path()
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| FeedbackStatsError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.schedule.notification_time, "08:00");
        assert_eq!(cfg.schedule.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(cfg.answers.released_statuses.len(), 3);
        assert_eq!(cfg.log.filter, "info");
    }

    #[test]
    fn notification_time_becomes_offset_from_midnight() {
        let cfg = Config::parse("[schedule]\nnotification_time = \"07:30\"\n").unwrap();
        let offset = cfg.schedule.notification_offset().unwrap();
        assert_eq!(offset, Duration::minutes(7 * 60 + 30));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let cfg = Config::parse("[schedule]\ntimezone = \"Mars/Olympus\"\n").unwrap();
        assert!(matches!(cfg.schedule.tz(), Err(FeedbackStatsError::Config(_))));
    }
}
