//! Pipeline orchestrator coordinating the analysis stages.
//!
//! The orchestrator runs the stages strictly in dependency order: generate,
//! profile, features, train. Before each stage it checks whether the stage's
//! outputs are fresh, and skips the stage body when they are. Freshness
//! means every output artifact exists and the input and parameter
//! fingerprints recorded in its manifest match the store's current state.
//! A stage failure stops the run; later stages are not attempted.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::dataset::GenerationParams;
use crate::store::{Artifact, ArtifactKey, ArtifactStore, StageId, StorageError, Tier};

use super::config::{ConfigError, PipelineConfig};
use super::stage::{
    FeatureStage, GenerateStage, PipelineStage, ProfileStage, StageError, TrainStage,
};

/// A stage failure, tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("Stage '{stage}' failed: {source}")]
pub struct StageExecutionError {
    pub stage: StageId,
    #[source]
    pub source: StageError,
}

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A stage failed.
    #[error(transparent)]
    Stage(#[from] StageExecutionError),

    /// Storage error outside any stage body.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of one stage within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Outputs were fresh; the stage body never ran.
    SkippedCached,
    /// The stage ran and published its outputs.
    Ran,
    /// The stage failed; the run stopped here.
    Failed,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::SkippedCached => write!(f, "skipped_cached"),
            StageStatus::Ran => write!(f, "ran"),
            StageStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one stage within a run.
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub stage: StageId,
    pub status: StageStatus,
    pub duration: Duration,
    /// Error message when the stage failed.
    pub error: Option<String>,
}

/// Summary of one pipeline run, stage by stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub records: Vec<StageRecord>,
}

impl PipelineRun {
    /// Number of stages that actually ran.
    pub fn executed(&self) -> usize {
        self.count(StageStatus::Ran)
    }

    /// Number of stages skipped because their outputs were fresh.
    pub fn skipped(&self) -> usize {
        self.count(StageStatus::SkippedCached)
    }

    /// Whether every attempted stage succeeded.
    pub fn is_success(&self) -> bool {
        self.records.iter().all(|r| r.status != StageStatus::Failed)
    }

    /// The record for one stage, if it was reached.
    pub fn record(&self, stage: StageId) -> Option<&StageRecord> {
        self.records.iter().find(|r| r.stage == stage)
    }

    fn count(&self, status: StageStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

/// Current store state for one output artifact, as shown by `status`.
#[derive(Debug, Clone)]
pub struct ArtifactState {
    pub key: ArtifactKey,
    /// Fingerprint of the published artifact, when one exists.
    pub fingerprint: Option<String>,
    /// Why the artifact is unusable, when it is present but damaged.
    pub corrupt: Option<String>,
}

/// Current store state for one stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: StageId,
    pub outputs: Vec<ArtifactState>,
    pub fresh: bool,
}

/// Main orchestrator that runs stages against the artifact store.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    store: ArtifactStore,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineOrchestrator {
    /// Creates a new orchestrator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` when the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let store = ArtifactStore::new(config.project_root.clone());
        let params = GenerationParams::new(config.seed, config.contract_count);
        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(GenerateStage::new(params)),
            Box::new(ProfileStage::new()),
            Box::new(FeatureStage::new()),
            Box::new(TrainStage::new()),
        ];

        Ok(Self {
            config,
            store,
            stages,
        })
    }

    /// Gets the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Gets the artifact store the orchestrator publishes through.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Runs every stage in dependency order.
    ///
    /// Fresh stages are skipped unless the configuration carries `force`.
    /// A stage failure is recorded and stops the run; the partial summary is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Storage` when a freshness check fails for a
    /// reason other than a missing or corrupt artifact.
    pub async fn run(&self) -> Result<PipelineRun, PipelineError> {
        let mut run = PipelineRun::default();

        for stage in &self.stages {
            let id = stage.id();
            let start = Instant::now();

            if !self.config.force && self.is_fresh(stage.as_ref()).await? {
                tracing::info!(stage = %id, "Outputs are fresh, skipping");
                run.records.push(StageRecord {
                    stage: id,
                    status: StageStatus::SkippedCached,
                    duration: start.elapsed(),
                    error: None,
                });
                continue;
            }

            tracing::info!(stage = %id, "Running stage");
            match stage.execute(&self.store).await {
                Ok(artifacts) => {
                    tracing::info!(
                        stage = %id,
                        artifacts = artifacts.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Stage completed"
                    );
                    run.records.push(StageRecord {
                        stage: id,
                        status: StageStatus::Ran,
                        duration: start.elapsed(),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::error!(stage = %id, error = %e, "Stage failed, stopping run");
                    run.records.push(StageRecord {
                        stage: id,
                        status: StageStatus::Failed,
                        duration: start.elapsed(),
                        error: Some(e.to_string()),
                    });
                    break;
                }
            }
        }

        Ok(run)
    }

    /// Executes one stage unconditionally, without freshness checks.
    ///
    /// # Errors
    ///
    /// Returns `StageExecutionError` wrapping whatever the stage body raised.
    pub async fn execute_stage(
        &self,
        id: StageId,
    ) -> Result<Vec<Artifact>, StageExecutionError> {
        let stage = self
            .stages
            .iter()
            .find(|s| s.id() == id)
            .expect("every stage id is registered");

        stage
            .execute(&self.store)
            .await
            .map_err(|source| StageExecutionError { stage: id, source })
    }

    /// Removes every derived artifact, leaving the raw tier untouched.
    ///
    /// Returns the number of artifacts removed.
    pub async fn clean(&self) -> Result<usize, PipelineError> {
        let removed = self.store.invalidate(&Tier::CLEANABLE).await?;
        tracing::info!(removed, "Cleaned derived artifacts");
        Ok(removed)
    }

    /// Reports the store state and freshness of every stage.
    ///
    /// Missing and corrupt artifacts are reported as such; other storage
    /// failures propagate.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Storage` when a store read fails for a reason
    /// other than a missing or corrupt artifact.
    pub async fn status(&self) -> Result<Vec<StageReport>, PipelineError> {
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let fresh = self.is_fresh(stage.as_ref()).await?;
            let mut outputs = Vec::new();
            for key in stage.outputs() {
                let (fingerprint, corrupt) = match self.store.get(key).await {
                    Ok(artifact) => (Some(artifact.fingerprint().to_string()), None),
                    Err(StorageError::NotFound(_)) => (None, None),
                    Err(StorageError::Corrupt { reason, .. }) => (None, Some(reason)),
                    Err(e) => return Err(e.into()),
                };
                outputs.push(ArtifactState {
                    key,
                    fingerprint,
                    corrupt,
                });
            }
            reports.push(StageReport {
                stage: stage.id(),
                outputs,
                fresh,
            });
        }
        Ok(reports)
    }

    /// Whether every output of the stage exists and is up to date.
    ///
    /// Missing and corrupt artifacts count as stale; other storage failures
    /// propagate.
    async fn is_fresh(&self, stage: &dyn PipelineStage) -> Result<bool, PipelineError> {
        for key in stage.outputs() {
            let artifact = match self.store.get(key).await {
                Ok(a) => a,
                Err(StorageError::NotFound(_)) => return Ok(false),
                Err(StorageError::Corrupt { key, reason }) => {
                    tracing::warn!(%key, %reason, "Treating corrupt artifact as stale");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };

            if artifact.manifest.provenance.params.as_deref()
                != stage.params_fingerprint().as_deref()
            {
                return Ok(false);
            }

            for input in stage.inputs() {
                let current = match self.store.get(input).await {
                    Ok(a) => a.fingerprint().to_string(),
                    Err(StorageError::NotFound(_)) => return Ok(false),
                    Err(StorageError::Corrupt { key, reason }) => {
                        tracing::warn!(%key, %reason, "Treating corrupt input as stale");
                        return Ok(false);
                    }
                    Err(e) => return Err(e.into()),
                };
                if artifact.manifest.provenance.input_fingerprint(input) != Some(current.as_str())
                {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}
