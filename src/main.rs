use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tabled::{settings::Style, Table, Tabled};

use readyrs::config::EngineConfig;
use readyrs::engine::{DailyInput, DailyReport, ScoreEngine};
use readyrs::error::ReadyRsError;
use readyrs::history::InMemoryScoreRepository;
use readyrs::insights::FactorStatus;
use readyrs::logging::init_logging;
use readyrs::recovery::RecoveryCategory;
use readyrs::sleep_consistency::format_clock;

/// ReadyRS - Daily readiness scores from wearable data
///
/// Computes recovery, strain and sleep scores for a day of heart-rate, HRV,
/// sleep and workout samples, measured against your own rolling baseline.
#[derive(Parser)]
#[command(name = "readyrs")]
#[command(version)]
#[command(about = "Recovery, strain and sleep scoring CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one day of samples
    Score {
        /// Day input file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// History file (JSON); created if missing and updated with the new day
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl ScoreRow {
    fn new(metric: &str, value: String, detail: impl Into<String>) -> Self {
        ScoreRow {
            metric: metric.to_string(),
            value,
            detail: detail.into(),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load_or_default()?,
    };
    Ok(config)
}

fn load_input(path: &Path) -> Result<DailyInput> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let input: DailyInput = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input file: {}", path.display()))?;
    input
        .validate()
        .map_err(ReadyRsError::from)
        .with_context(|| format!("Invalid record in {}", path.display()))?;
    Ok(input)
}

fn colored_recovery(score: f64, category: RecoveryCategory) -> ColoredString {
    let text = format!("{:.0}%", score);
    match category {
        RecoveryCategory::Optimal => text.green().bold(),
        RecoveryCategory::Moderate => text.yellow().bold(),
        RecoveryCategory::Poor => text.red().bold(),
    }
}

fn print_report(report: &DailyReport) {
    println!(
        "{}",
        format!("Readiness for {}", report.date).cyan().bold()
    );

    match &report.recovery {
        Some(recovery) => println!(
            "Recovery: {} ({})",
            colored_recovery(recovery.score, recovery.category),
            recovery.category.description()
        ),
        None => println!("Recovery: {}", "not available".dimmed()),
    }
    println!();

    let mut rows = Vec::new();
    if let Some(recovery) = &report.recovery {
        rows.push(ScoreRow::new(
            "Recovery",
            format!("{:.0}", recovery.score),
            format!(
                "HRV {:+.1}%, RHR {:+.1}%",
                recovery.components.hrv_deviation, recovery.components.rhr_deviation
            ),
        ));
    }
    rows.push(ScoreRow::new(
        "Strain",
        format!("{:.1}", report.strain.score),
        format!(
            "{} ({:.0} active min)",
            report.strain.category, report.strain.components.activity_minutes
        ),
    ));
    if let Some(sleep) = &report.sleep {
        rows.push(ScoreRow::new(
            "Sleep",
            format!("{:.0}", sleep.score),
            format!(
                "{:.1} h of {:.1} h need, {:.0}% efficient",
                sleep.components.total_duration_minutes / 60.0,
                sleep.components.sleep_need_minutes / 60.0,
                sleep.components.efficiency * 100.0
            ),
        ));
    }
    if let Some(hrv) = report.hrv {
        rows.push(ScoreRow::new(
            "HRV",
            format!("{:.1} ms", hrv),
            format!("baseline {:.1} ms", report.user_baseline.hrv_baseline_7day),
        ));
    }
    if let Some(rhr) = report.resting_heart_rate {
        rows.push(ScoreRow::new(
            "Resting HR",
            format!("{:.0} bpm", rhr),
            format!("baseline {:.1} bpm", report.user_baseline.rhr_baseline_7day),
        ));
    }
    rows.push(ScoreRow::new(
        "Sleep debt",
        format!("{:.1} h", report.sleep_debt.debt_hours),
        format!("{} ({})", report.sleep_debt.severity, report.sleep_debt.trend),
    ));
    let consistency = &report.sleep_consistency;
    rows.push(ScoreRow::new(
        "Consistency",
        format!("{:.0}", consistency.score),
        if consistency.nights_analyzed >= readyrs::sleep_consistency::MIN_NIGHTS {
            format!(
                "{}, bed {} wake {}",
                consistency.rating,
                format_clock(consistency.average_bedtime_minutes),
                format_clock(consistency.average_wake_minutes)
            )
        } else {
            consistency.rating.to_string()
        },
    ));
    if let Some(guidance) = &report.strain_guidance {
        rows.push(ScoreRow::new(
            "Target strain",
            format!(
                "{:.0}-{:.0}",
                guidance.target_strain_min, guidance.target_strain_max
            ),
            format!("weekly load {}", guidance.weekly_load_status),
        ));
    }
    rows.push(ScoreRow::new(
        "Baseline",
        report.baseline.phase.to_string(),
        format!("{} days", report.baseline.days_available),
    ));
    rows.push(ScoreRow::new(
        "Data quality",
        report.data_quality.level.to_string(),
        format!("{:.0}% confidence", report.data_quality.confidence * 100.0),
    ));

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!();

    println!("{}", report.insight.headline.bold());
    println!("  {}", report.insight.recommendation);
    for factor in &report.insight.factors {
        let marker = match factor.status {
            FactorStatus::Positive => "+".green(),
            FactorStatus::Neutral => "=".normal(),
            FactorStatus::Negative => "-".red(),
        };
        println!("  {} {}", marker, factor.description);
    }
    if let Some(guidance) = &report.strain_guidance {
        println!("  {} {}", "•".cyan(), guidance.recommendation);
    }
    println!("  {} {}", "•".cyan(), report.sleep_debt.recommendation);

    for issue in &report.data_quality.issues {
        println!("  {}", issue.dimmed());
    }
}

fn run_score(
    config: EngineConfig,
    input: &Path,
    history: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let input = load_input(input)?;

    let mut repository = match history {
        Some(path) if path.exists() => InMemoryScoreRepository::load_from_file(path)
            .with_context(|| format!("Failed to load history: {}", path.display()))?,
        _ => InMemoryScoreRepository::new(),
    };

    let engine = ScoreEngine::new(config);
    let report = engine.process_day(&input, &mut repository)?;

    if let Some(path) = history {
        repository
            .save_to_file(path)
            .with_context(|| format!("Failed to save history: {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

fn run_config(path: Option<&Path>, init: bool, show: bool) -> Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(EngineConfig::default_config_path);

    if init {
        if config_path.exists() {
            println!(
                "{}",
                format!("Config already exists: {}", config_path.display()).yellow()
            );
        } else {
            EngineConfig::default().save_to_file(&config_path)?;
            println!(
                "{}",
                format!("✓ Wrote default config to {}", config_path.display()).green()
            );
        }
    }

    if show || !init {
        let config = load_config(path)?;
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.command {
        Commands::Config { init: true, .. } => EngineConfig::default(),
        _ => load_config(cli.config.as_deref())?,
    };
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Score {
            input,
            history,
            format,
        } => run_score(config, &input, history.as_deref(), format),

        Commands::Config { init, show } => run_config(cli.config.as_deref(), init, show),
    }
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        match err.chain().find_map(|e| e.downcast_ref::<ReadyRsError>()) {
            Some(cause) => {
                tracing::error!(severity = ?cause.severity(), "{:#}", err);
                eprintln!("{} {}", "Error:".red().bold(), cause.user_message());
                process::exit(cause.exit_code());
            }
            None => {
                eprintln!("{} {:#}", "Error:".red().bold(), err);
                process::exit(1);
            }
        }
    }
}
