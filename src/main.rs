use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use survey_pipeline::app::survey_use_case::{check_columns, SurveyUseCase};
use survey_pipeline::config::Config;
use survey_pipeline::infra::csv_table::{file_sha256, read_table};
use survey_pipeline::infra::output_adapter::FileOutputAdapter;
use survey_pipeline::logging;
use survey_pipeline::types::Table;

#[derive(Parser)]
#[command(name = "survey_pipeline")]
#[command(about = "Information-security survey cleaning and scoring pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults to survey.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage and write reports plus the run manifest
    Run {
        /// Raw form export (overrides the configured input)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Drop sensitive columns, rename fields and write the codebook
    Clean {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Score the composite indices of a cleaned table
    Indices {
        #[arg(long)]
        input: PathBuf,
    },
    /// Classify respondents of an indexed table and summarize by group
    Groups {
        #[arg(long)]
        input: PathBuf,
    },
    /// Descriptive statistics of the indices of an indexed table
    Describe {
        #[arg(long)]
        input: PathBuf,
    },
    /// Resolve every canonical field against the raw headers
    CheckColumns {
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn load(path: &Path) -> Result<Table> {
    read_table(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn use_case(config: &Config) -> SurveyUseCase {
    let output = FileOutputAdapter::new(config.output_dir.clone(), config.files.clone());
    SurveyUseCase::new(Box::new(output), config.consent_position, config.answer_key())
}

fn main() -> Result<()> {
    // Dropped on return, flushing the log file
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { input } => {
            let input = input.unwrap_or_else(|| config.input.clone());
            info!("Running full pipeline on {}", input.display());
            let raw = load(&input)?;
            let checksum = file_sha256(&input)
                .with_context(|| format!("Failed to hash {}", input.display()))?;
            let result = use_case(&config).run_all(&raw, Some(checksum)).context("Pipeline run failed")?;

            println!("Run {} processed {} respondents", result.run_id, result.respondents);
            for (kind, count) in &result.warnings {
                println!("  {} warnings: {}", kind, count);
            }
            for artifact in &result.artifacts {
                println!("  wrote {}", artifact);
            }
        }
        Commands::Clean { input } => {
            let input = input.unwrap_or_else(|| config.input.clone());
            let raw = load(&input)?;
            let cleaned = use_case(&config).run_clean(&raw).context("Cleaning stage failed")?;
            println!(
                "Cleaned {} respondents: {} fields mapped, {} columns dropped",
                cleaned.table.len(),
                cleaned.mapping.len(),
                cleaned.dropped.len()
            );
        }
        Commands::Indices { input } => {
            let cleaned = load(&input)?;
            let indexed = use_case(&config).run_indices(&cleaned).context("Index stage failed")?;
            println!(
                "Scored {} respondents ({} coercion warnings)",
                indexed.table.len(),
                indexed.warnings.len()
            );
        }
        Commands::Groups { input } => {
            let indexed = load(&input)?;
            let grouped = use_case(&config).run_groups(&indexed).context("Classification stage failed")?;
            println!(
                "Classified {} respondents into {} group columns ({} fallbacks)",
                grouped.table.len(),
                grouped.groups.len(),
                grouped.warnings.len()
            );
        }
        Commands::Describe { input } => {
            let indexed = load(&input)?;
            let summary = use_case(&config).run_describe(&indexed).context("Describe failed")?;
            for row in &summary {
                println!(
                    "{:<28} n={:<4} mean={:<8} median={}",
                    row.index,
                    row.count,
                    fmt_stat(row.mean),
                    fmt_stat(row.median)
                );
            }
        }
        Commands::CheckColumns { input } => {
            let input = input.unwrap_or_else(|| config.input.clone());
            let raw = load(&input)?;
            match check_columns(&raw, config.consent_position) {
                Ok(resolutions) => {
                    for r in &resolutions {
                        println!("{:<36} <- [{}] {}", r.spec.canonical, r.position, r.header);
                        for alt in &r.alternatives {
                            println!("{:<36}    also matches: {}", "", alt);
                        }
                    }
                    let multiple = resolutions.iter().filter(|r| !r.is_unique()).count();
                    println!(
                        "All {} fields resolved, {} matched more than one column",
                        resolutions.len(),
                        multiple
                    );
                }
                Err(e) => {
                    warn!("Column check failed: {}", e);
                    return Err(e).context("Column check failed");
                }
            }
        }
    }

    Ok(())
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".to_string())
}
