use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use uuid::Uuid;

mod cache;
mod client;
mod labels;
mod models;
mod report;
mod rules;
mod scoring;
mod stats;

use cache::SnapshotCache;
use client::SheetClient;
use models::SurveyRecord;
use rules::ScoringRules;

#[derive(Parser)]
#[command(name = "ecosurvey-report")]
#[command(about = "Cohort statistics for the EcoSurvey plastic-waste survey", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Sheet endpoint URL; defaults to the ECOSURVEY_SHEET_URL environment variable
    #[arg(long)]
    url: Option<String>,
    /// Read records from a local JSON file instead of the network
    #[arg(long)]
    input: Option<PathBuf>,
    /// Alternate scoring rule set (JSON)
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Directory holding the fetched-data snapshot
    #[arg(long, default_value = ".ecosurvey-cache")]
    cache_dir: PathBuf,
    /// Drop the snapshot and fetch fresh data
    #[arg(long)]
    refresh: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print cohort statistics
    Score {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Submit one response read from a JSON file
    Submit {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { source } => {
            let rules = load_rules(source.rules.as_deref())?;
            let records = load_cohort(&source).await?;
            print_stats(&records, &rules);
        }
        Commands::Report { source, out } => {
            let rules = load_rules(source.rules.as_deref())?;
            let records = load_cohort(&source).await?;
            let report = report::build_report(Utc::now().date_naive(), &records, &rules);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Submit { input, url } => {
            let mut record = read_submission(&input)?;
            record
                .id
                .get_or_insert_with(|| Uuid::new_v4().to_string());
            record
                .timestamp
                .get_or_insert_with(|| Utc::now().to_rfc3339());

            let client = SheetClient::new(endpoint_url(url)?);
            client.submit(&record).await?;
            println!(
                "Response {} submitted.",
                record.id.as_deref().unwrap_or("n/a")
            );
        }
    }

    Ok(())
}

fn endpoint_url(flag: Option<String>) -> anyhow::Result<String> {
    match flag {
        Some(url) => Ok(url),
        None => std::env::var("ECOSURVEY_SHEET_URL")
            .context("pass --url or set ECOSURVEY_SHEET_URL to the sheet endpoint"),
    }
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<ScoringRules> {
    match path {
        Some(path) => ScoringRules::from_file(path),
        None => Ok(ScoringRules::default()),
    }
}

async fn load_cohort(source: &SourceArgs) -> anyhow::Result<Vec<SurveyRecord>> {
    if let Some(path) = &source.input {
        return read_local_records(path);
    }

    let cache = SnapshotCache::new(&source.cache_dir);
    if source.refresh {
        cache.clear();
    }
    let client = SheetClient::new(endpoint_url(source.url.clone())?);
    client::load_records(&client, &cache).await
}

/// Accepts either a bare record array or the `{status, data}` envelope the
/// endpoint produces, then applies the usual validity filter.
fn read_local_records(path: &Path) -> anyhow::Result<Vec<SurveyRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => bail!("{} does not contain a record array", path.display()),
        },
        _ => bail!("{} does not contain a record array", path.display()),
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<SurveyRecord>(entry).ok())
        .filter(SurveyRecord::is_valid)
        .collect())
}

fn read_submission(path: &Path) -> anyhow::Result<SurveyRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a single survey response", path.display()))
}

fn print_stats(records: &[SurveyRecord], rules: &ScoringRules) {
    let stats = stats::aggregate(records, rules);

    if stats.total == 0 {
        println!("No survey responses available.");
        return;
    }

    println!("Responses: {}", stats.total);
    println!(
        "Knowledge score: {}% ({})",
        stats.knowledge_score_pct,
        report::knowledge_assessment(stats.knowledge_score_pct)
    );
    println!(
        "Behavior score: {}% ({})",
        stats.behavior_score_pct,
        report::behavior_assessment(stats.behavior_score_pct)
    );
    println!("Participation rate: {}%", stats.participation_rate_pct);

    if !stats.age_distribution.is_empty() {
        println!("Age groups:");
        for (code, count) in &stats.age_distribution {
            println!("- {}: {}", labels::age_label(code), count);
        }
    }
    if !stats.occupation_distribution.is_empty() {
        println!("Occupations:");
        for (code, count) in &stats.occupation_distribution {
            println!("- {}: {}", labels::occupation_label(code), count);
        }
    }
}
