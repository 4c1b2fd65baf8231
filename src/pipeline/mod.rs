//! Pipeline orchestration for the contract analysis workflow.
//!
//! This module wires the computation subsystems to the artifact store and
//! runs them in dependency order with freshness-based caching.
//!
//! # Architecture
//!
//! The pipeline consists of several components:
//!
//! - **Orchestrator**: Runs the stages in order, skipping fresh ones
//! - **Stages**: Store-facing adapters around the generator, profiler,
//!   feature builder, and model trainer
//! - **Config**: Configuration for the store root and generation parameters
//!
//! # Pipeline Flow
//!
//! 1. **Generate**: The synthetic contract dataset is published to the raw tier
//! 2. **Profile**: Per-column statistics are published as a report
//! 3. **Features**: Per-contract aggregates land in the interim tier, the
//!    derived feature table in the processed tier
//! 4. **Train**: The cost-growth model is fitted and published to the model tier
//!
//! Every published artifact records the fingerprints of its inputs and of
//! the parameters that produced it. A stage whose recorded fingerprints
//! match the store's current state is skipped on the next run; `force`
//! bypasses the check.
//!
//! # Example
//!
//! ```rust,ignore
//! use cfa_forge::pipeline::{PipelineConfig, PipelineOrchestrator};
//!
//! let config = PipelineConfig::new()
//!     .with_project_root("./workspace")
//!     .with_seed(42)
//!     .with_contract_count(1000);
//!
//! let orchestrator = PipelineOrchestrator::new(config)?;
//! let run = orchestrator.run().await?;
//!
//! for record in &run.records {
//!     println!("{}: {}", record.stage, record.status);
//! }
//! ```

pub mod config;
pub mod orchestrator;
pub mod stage;

// Re-export main types for convenience
pub use config::{ConfigError, PipelineConfig, DEFAULT_CONTRACT_COUNT, DEFAULT_SEED};
pub use orchestrator::{
    ArtifactState, PipelineError, PipelineOrchestrator, PipelineRun, StageExecutionError,
    StageRecord, StageReport, StageStatus,
};
pub use stage::{
    feature_table_key, model_key, prepared_table_key, profile_report_key, raw_dataset_key,
    FeatureStage, GenerateStage, PipelineStage, ProfileStage, StageError, TrainStage,
};
