mod fixtures;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use fixtures::FixtureSource;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use feedback_stats_common::Config;
use feedback_stats_core::{
    outcome, FeedbackStatisticData, FeedbackStatisticGenerators, FeedbackStatisticOutcome,
    FeedbackStatisticType, IssueDatesCalculator, Questionnaire, QuestionnaireSettings,
    RelativeFrequencyTimeSeriesGenerator, UniformNoise,
};

#[derive(Parser)]
#[command(name = "feedback-stats", version, about = "Feedback statistics over questionnaire answers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the time series of stored configurations, one JSON outcome per line.
    Generate {
        #[arg(long)]
        fixtures: PathBuf,
        /// Seed the jitter for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Configuration ids; all configurations if omitted
        ids: Vec<i64>,
    },
    /// Print the reconstructed issue dates of a questionnaire.
    Schedule {
        #[arg(long)]
        questionnaire: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    init_tracing(&config);
    match cli.command {
        Commands::Generate { fixtures, seed, ids } => run_generate(&config, fixtures, seed, ids).await?,
        Commands::Schedule { questionnaire } => run_schedule(&config, questionnaire)?,
    }
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_generate(
    config: &Config,
    fixtures: PathBuf,
    seed: Option<u64>,
    ids: Vec<i64>,
) -> anyhow::Result<()> {
    let source = Arc::new(
        FixtureSource::load(&fixtures)
            .with_context(|| format!("loading fixtures from {}", fixtures.display()))?,
    );
    let ids = if ids.is_empty() { source.configuration_ids() } else { ids };
    let generator = Arc::new(
        RelativeFrequencyTimeSeriesGenerator::from_config(config, source.clone(), source)
            .map_err(|e| anyhow::anyhow!("{e}"))?,
    );
    info!(configurations = ids.len(), "generating feedback statistics");

    // one task per configuration; a failing one never aborts the others
    let tasks = ids.iter().map(|&id| {
        let generator = generator.clone();
        tokio::spawn(async move { generate_one(generator, id, seed).await })
    });
    for (joined, id) in join_all(tasks).await.into_iter().zip(&ids) {
        match joined {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
            Err(e) => error!(configuration = id, error = %e, "generation task panicked"),
        }
    }
    Ok(())
}

async fn generate_one(
    generator: Arc<RelativeFrequencyTimeSeriesGenerator>,
    id: i64,
    seed: Option<u64>,
) -> FeedbackStatisticOutcome {
    let kind = FeedbackStatisticType::RelativeFrequencyTimeSeries;
    match seed {
        Some(seed) => {
            let mut noise = UniformNoise::seeded(seed.wrapping_add(id as u64));
            let result = generator
                .generate_data_with(id, &mut noise)
                .await
                .map(FeedbackStatisticData::RelativeFrequencyTimeSeries);
            outcome(kind, id, result)
        }
        None => FeedbackStatisticGenerators::new(generator).generate(kind, id).await,
    }
}

fn run_schedule(config: &Config, path: PathBuf) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let questionnaire: Questionnaire =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    let calculator =
        IssueDatesCalculator::from_config(&config.schedule).map_err(|e| anyhow::anyhow!("{e}"))?;
    for line in schedule_lines(&calculator, &questionnaire)? {
        println!("{line}");
    }
    Ok(())
}

fn schedule_lines(
    calculator: &IssueDatesCalculator,
    questionnaire: &Questionnaire,
) -> anyhow::Result<Vec<String>> {
    let settings = QuestionnaireSettings::from(questionnaire);
    let tz = calculator.calendar().tz();
    let dates = calculator
        .issue_dates(&settings, Utc::now())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(dates
        .iter()
        .map(|d| format!("{}  {}", d.format("%Y-%m-%dT%H:%M:%SZ"), d.with_timezone(&tz).format("%a %Y-%m-%d %H:%M %Z")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_generate_arguments() {
        let cli = Cli::try_parse_from(["feedback-stats", "generate", "--fixtures", "fx", "--seed", "4", "3", "7"])
            .unwrap();
        match cli.command {
            Commands::Generate { fixtures, seed, ids } => {
                assert_eq!(fixtures, PathBuf::from("fx"));
                assert_eq!(seed, Some(4));
                assert_eq!(ids, vec![3, 7]);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn schedule_lists_utc_and_local_dates() {
        let questionnaire: Questionnaire = serde_json::from_str(
            r#"{"id": 1, "version": 1, "createdAt": "2022-12-01T00:00:00.000Z",
                "cycleAmount": 1, "cycleUnit": "day", "activateAfterDays": 0, "deactivateAfterDays": 1}"#,
        )
        .unwrap();
        let lines = schedule_lines(&IssueDatesCalculator::default(), &questionnaire).unwrap();
        assert_eq!(
            lines,
            vec![
                "2022-12-01T07:00:00Z  Thu 2022-12-01 08:00 CET",
                "2022-12-02T07:00:00Z  Fri 2022-12-02 08:00 CET",
            ]
        );
    }

    #[test]
    fn schedule_rejects_spontaneous_questionnaire() {
        let questionnaire: Questionnaire =
            serde_json::from_str(r#"{"id": 1, "version": 1, "cycleUnit": "spontan"}"#).unwrap();
        assert!(schedule_lines(&IssueDatesCalculator::default(), &questionnaire).is_err());
    }
}
