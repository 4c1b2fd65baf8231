//! CLI command definitions for cfa-forge.
//!
//! This module provides the command-line surface for the contract financial
//! analysis pipeline: dataset generation, profiling, feature derivation,
//! model training, cached end-to-end runs, and cache maintenance.

use crate::pipeline::{
    PipelineConfig, PipelineOrchestrator, StageStatus, DEFAULT_CONTRACT_COUNT, DEFAULT_SEED,
};
use crate::store::StageId;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

/// File name for appended execution logs under the `logs/` tier.
pub const LOG_FILENAME: &str = "cfa-forge.log";

/// Contract financial analysis pipeline over a tiered artifact store.
#[derive(Parser)]
#[command(name = "cfa-forge")]
#[command(about = "Generate, profile, and model synthetic contract financial data")]
#[command(version)]
#[command(
    long_about = "cfa-forge drives a staged data pipeline for contract financial analysis.\n\nEach stage publishes fingerprinted artifacts into a tiered store (data/raw,\ndata/interim, data/processed, models, reports/figures, logs) and reruns only\nwhen its inputs or parameters changed.\n\nExample usage:\n  cfa-forge pipeline --seed 42 --size 1000\n  cfa-forge status"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Project root holding the artifact store tiers.
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

impl Cli {
    /// Whether this invocation should append to the execution log file.
    ///
    /// Every command writes logs except `clean`, which deletes the `logs/`
    /// tier and must not recreate it mid-wipe.
    pub fn wants_file_log(&self) -> bool {
        !matches!(self.command, Commands::Clean(_))
    }
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate the synthetic contract dataset into the raw tier.
    #[command(alias = "generate-data")]
    Data(DataArgs),

    /// Profile the raw dataset and publish a statistical report.
    #[command(alias = "run-profiling")]
    Profile(ProfileArgs),

    /// Derive the model-ready feature table from the raw dataset.
    #[command(alias = "run-features")]
    Features(FeaturesArgs),

    /// Fit the cost growth regression on the processed feature table.
    #[command(alias = "run-train")]
    Train(TrainArgs),

    /// Run every stage in order, skipping stages whose inputs are unchanged.
    ///
    /// Freshness is decided per stage from the artifact manifests: a stage
    /// reruns when any output is missing, its parameters changed, or any
    /// recorded input fingerprint no longer matches the store.
    #[command(alias = "run-pipeline")]
    Pipeline(PipelineArgs),

    /// Delete derived artifacts, keeping the raw tier intact.
    Clean(CleanArgs),

    /// Report per-stage freshness and current output fingerprints.
    Status(StatusArgs),
}

/// Arguments for `cfa-forge data`.
#[derive(Parser, Debug)]
pub struct DataArgs {
    /// Seed for the deterministic generator.
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of contracts to generate (other tables scale from this).
    #[arg(long, default_value_t = DEFAULT_CONTRACT_COUNT)]
    pub size: usize,
}

/// Arguments for `cfa-forge profile`.
#[derive(Parser, Debug)]
pub struct ProfileArgs {}

/// Arguments for `cfa-forge features`.
#[derive(Parser, Debug)]
pub struct FeaturesArgs {}

/// Arguments for `cfa-forge train`.
#[derive(Parser, Debug)]
pub struct TrainArgs {}

/// Arguments for `cfa-forge pipeline`.
#[derive(Parser, Debug)]
pub struct PipelineArgs {
    /// Seed for the deterministic generator.
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of contracts to generate (other tables scale from this).
    #[arg(long, default_value_t = DEFAULT_CONTRACT_COUNT)]
    pub size: usize,

    /// Rerun every stage even when cached outputs are fresh.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for `cfa-forge clean`.
#[derive(Parser, Debug)]
pub struct CleanArgs {}

/// Arguments for `cfa-forge status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {}

/// Parse command-line arguments into a [`Cli`] value.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse arguments from the process environment and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the command selected by an already-parsed [`Cli`] value.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Data(args) => run_data_command(cli.root, args).await,
        Commands::Profile(_) => run_stage_command(cli.root, StageId::Profile).await,
        Commands::Features(_) => run_stage_command(cli.root, StageId::Features).await,
        Commands::Train(_) => run_stage_command(cli.root, StageId::Train).await,
        Commands::Pipeline(args) => run_pipeline_command(cli.root, args).await,
        Commands::Clean(_) => run_clean_command(cli.root).await,
        Commands::Status(_) => run_status_command(cli.root).await,
    }
}

// ============================================================================
// Command Implementation
// ============================================================================

async fn run_data_command(root: PathBuf, args: DataArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::new()
        .with_project_root(root)
        .with_seed(args.seed)
        .with_contract_count(args.size);
    let orchestrator = PipelineOrchestrator::new(config)?;

    info!(seed = args.seed, contracts = args.size, "Generating dataset");
    let artifacts = orchestrator.execute_stage(StageId::Generate).await?;

    for artifact in &artifacts {
        println!(
            "Published {} ({} files, fingerprint {})",
            artifact.key,
            artifact.manifest.files.len(),
            artifact.fingerprint(),
        );
    }
    Ok(())
}

/// Run a single downstream stage unconditionally.
///
/// Direct stage commands are an explicit request to recompute, so they skip
/// the freshness check that `pipeline` applies.
async fn run_stage_command(root: PathBuf, stage: StageId) -> anyhow::Result<()> {
    let config = PipelineConfig::new().with_project_root(root);
    let orchestrator = PipelineOrchestrator::new(config)?;

    info!(stage = %stage, "Running stage");
    let artifacts = orchestrator.execute_stage(stage).await?;

    for artifact in &artifacts {
        println!(
            "Published {} ({} files, fingerprint {})",
            artifact.key,
            artifact.manifest.files.len(),
            artifact.fingerprint(),
        );
    }
    Ok(())
}

async fn run_pipeline_command(root: PathBuf, args: PipelineArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::new()
        .with_project_root(root)
        .with_seed(args.seed)
        .with_contract_count(args.size)
        .with_force(args.force);
    let orchestrator = PipelineOrchestrator::new(config)?;

    info!(
        seed = args.seed,
        contracts = args.size,
        force = args.force,
        "Starting pipeline run"
    );
    let run = orchestrator.run().await?;

    println!("\n=== Pipeline Run ===");
    for record in &run.records {
        match record.status {
            StageStatus::Failed => println!(
                "  {:<10} {} ({})",
                record.stage.to_string(),
                record.status,
                record.error.as_deref().unwrap_or("unknown error"),
            ),
            _ => println!(
                "  {:<10} {} in {:.1}s",
                record.stage.to_string(),
                record.status,
                record.duration.as_secs_f64(),
            ),
        }
    }
    println!(
        "Executed {} stage(s), skipped {} cached",
        run.executed(),
        run.skipped()
    );

    if !run.is_success() {
        let failed = run
            .records
            .iter()
            .find(|r| r.status == StageStatus::Failed)
            .map(|r| r.stage.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(anyhow::anyhow!("Pipeline stopped at stage '{}'", failed));
    }
    Ok(())
}

async fn run_clean_command(root: PathBuf) -> anyhow::Result<()> {
    let config = PipelineConfig::new().with_project_root(root);
    let orchestrator = PipelineOrchestrator::new(config)?;

    let removed = orchestrator.clean().await?;
    if removed == 0 {
        warn!("Nothing to clean, derived tiers were already empty");
    }
    println!("Removed {removed} derived artifact(s), raw data kept");
    Ok(())
}

async fn run_status_command(root: PathBuf) -> anyhow::Result<()> {
    let config = PipelineConfig::new().with_project_root(root);
    let orchestrator = PipelineOrchestrator::new(config)?;

    let reports = orchestrator.status().await?;

    println!("\n=== Stage Status ===");
    for report in &reports {
        let freshness = if report.fresh { "fresh" } else { "stale" };
        println!("  {:<10} {}", report.stage.to_string(), freshness);
        for output in &report.outputs {
            match (&output.fingerprint, &output.corrupt) {
                (Some(fingerprint), _) => {
                    println!("    {:<20} {}", output.key.to_string(), fingerprint)
                }
                (None, Some(reason)) => {
                    println!("    {:<20} corrupt ({})", output.key.to_string(), reason)
                }
                (None, None) => println!("    {:<20} missing", output.key.to_string()),
            }
        }
    }
    Ok(())
}
