//! Stage adapters binding the computation subsystems to the artifact store.
//!
//! Each stage owns the store-facing half of one subsystem: it loads its
//! input artifacts, maps an absent input to the subsystem's `MissingInput`
//! error, runs the computation, and publishes the outputs with full
//! provenance. The orchestrator only talks to stages through the
//! `PipelineStage` trait, so freshness checks stay independent of what the
//! stages actually compute.

use async_trait::async_trait;
use thiserror::Error;

use crate::dataset::{
    csv, default_schema, Dataset, DatasetGenerator, DatasetSchema, GenerationParams,
};
use crate::error::{FeatureError, GenerationError, ModelError, ProfilingError};
use crate::features::{
    FeatureBuilder, FeatureTable, FEATURES_FILENAME, FEATURE_STATS_FILENAME, PREPARED_FILENAME,
};
use crate::model::{ModelTrainer, MODEL_FILENAME};
use crate::profile::{Profiler, REPORT_FILENAME};
use crate::store::{
    Artifact, ArtifactKey, ArtifactPayload, ArtifactStore, Provenance, StageId, StorageError, Tier,
};

/// Store key of the raw generated dataset.
pub fn raw_dataset_key() -> ArtifactKey {
    ArtifactKey::new(StageId::Generate, Tier::Raw)
}

/// Store key of the profiling report.
pub fn profile_report_key() -> ArtifactKey {
    ArtifactKey::new(StageId::Profile, Tier::Report)
}

/// Store key of the prepared per-contract aggregate table.
pub fn prepared_table_key() -> ArtifactKey {
    ArtifactKey::new(StageId::Features, Tier::Interim)
}

/// Store key of the derived feature table.
pub fn feature_table_key() -> ArtifactKey {
    ArtifactKey::new(StageId::Features, Tier::Processed)
}

/// Store key of the fitted cost-growth model.
pub fn model_key() -> ArtifactKey {
    ArtifactKey::new(StageId::Train, Tier::Model)
}

/// Error raised by a stage body, tagged by subsystem.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Profiling(#[from] ProfilingError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One runnable unit of the pipeline.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stable identifier of the stage.
    fn id(&self) -> StageId;

    /// Artifacts the stage reads.
    fn inputs(&self) -> Vec<ArtifactKey>;

    /// Artifacts the stage publishes.
    fn outputs(&self) -> Vec<ArtifactKey>;

    /// Fingerprint of the stage's effective parameters, when it has any.
    fn params_fingerprint(&self) -> Option<String> {
        None
    }

    /// Runs the stage against the store and returns the published artifacts.
    async fn execute(&self, store: &ArtifactStore) -> Result<Vec<Artifact>, StageError>;
}

// ============================================================================
// Generate
// ============================================================================

/// Generates the synthetic dataset and publishes it to the raw tier.
pub struct GenerateStage {
    params: GenerationParams,
    schema: DatasetSchema,
}

impl GenerateStage {
    pub fn new(params: GenerationParams) -> Self {
        Self {
            params,
            schema: default_schema(),
        }
    }
}

#[async_trait]
impl PipelineStage for GenerateStage {
    fn id(&self) -> StageId {
        StageId::Generate
    }

    fn inputs(&self) -> Vec<ArtifactKey> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<ArtifactKey> {
        vec![raw_dataset_key()]
    }

    fn params_fingerprint(&self) -> Option<String> {
        Some(self.params.fingerprint())
    }

    async fn execute(&self, store: &ArtifactStore) -> Result<Vec<Artifact>, StageError> {
        let generator = DatasetGenerator::new(self.schema.clone())?;
        let dataset = generator.generate(&self.params)?;
        let payload = dataset
            .to_payload(&self.schema)
            .map_err(GenerationError::from)?;

        let provenance = Provenance::new().with_params(self.params.fingerprint());
        let artifact = store.put(raw_dataset_key(), payload, provenance).await?;
        Ok(vec![artifact])
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Profiles the raw dataset and publishes the report.
pub struct ProfileStage {
    schema: DatasetSchema,
}

impl ProfileStage {
    pub fn new() -> Self {
        Self {
            schema: default_schema(),
        }
    }
}

impl Default for ProfileStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for ProfileStage {
    fn id(&self) -> StageId {
        StageId::Profile
    }

    fn inputs(&self) -> Vec<ArtifactKey> {
        vec![raw_dataset_key()]
    }

    fn outputs(&self) -> Vec<ArtifactKey> {
        vec![profile_report_key()]
    }

    async fn execute(&self, store: &ArtifactStore) -> Result<Vec<Artifact>, StageError> {
        let raw = store.get(raw_dataset_key()).await.map_err(|e| match e {
            StorageError::NotFound(_) => StageError::Profiling(ProfilingError::MissingInput(e)),
            other => StageError::Storage(other),
        })?;
        let dataset = Dataset::from_artifact(store, &raw, &self.schema)
            .await
            .map_err(ProfilingError::from)?;

        let report = Profiler::new(self.schema.clone()).profile(&dataset)?;
        let payload = ArtifactPayload::single(
            REPORT_FILENAME,
            report.to_json().map_err(ProfilingError::from)?,
        );

        let provenance = Provenance::new().with_input(raw_dataset_key(), raw.fingerprint());
        let artifact = store.put(profile_report_key(), payload, provenance).await?;
        Ok(vec![artifact])
    }
}

// ============================================================================
// Features
// ============================================================================

/// Derives features from the raw dataset, publishing the prepared aggregate
/// table to the interim tier and the feature table to the processed tier.
pub struct FeatureStage {
    schema: DatasetSchema,
}

impl FeatureStage {
    pub fn new() -> Self {
        Self {
            schema: default_schema(),
        }
    }
}

impl Default for FeatureStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for FeatureStage {
    fn id(&self) -> StageId {
        StageId::Features
    }

    fn inputs(&self) -> Vec<ArtifactKey> {
        vec![raw_dataset_key()]
    }

    fn outputs(&self) -> Vec<ArtifactKey> {
        vec![prepared_table_key(), feature_table_key()]
    }

    async fn execute(&self, store: &ArtifactStore) -> Result<Vec<Artifact>, StageError> {
        let raw = store.get(raw_dataset_key()).await.map_err(|e| match e {
            StorageError::NotFound(_) => StageError::Feature(FeatureError::MissingInput(e)),
            other => StageError::Storage(other),
        })?;
        let dataset = Dataset::from_artifact(store, &raw, &self.schema)
            .await
            .map_err(FeatureError::from)?;

        let build = FeatureBuilder::new().build(&dataset)?;
        let provenance = Provenance::new().with_input(raw_dataset_key(), raw.fingerprint());

        let prepared_payload = ArtifactPayload::single(
            PREPARED_FILENAME,
            csv::encode(&build.prepared.columns, &build.prepared.rows).into_bytes(),
        );
        let prepared = store
            .put(prepared_table_key(), prepared_payload, provenance.clone())
            .await?;

        let features_payload = ArtifactPayload::new()
            .with_file(FEATURES_FILENAME, build.features.to_csv().into_bytes())
            .with_file(
                FEATURE_STATS_FILENAME,
                build.stats.to_json().map_err(FeatureError::from)?,
            );
        let features = store
            .put(feature_table_key(), features_payload, provenance)
            .await?;

        Ok(vec![prepared, features])
    }
}

// ============================================================================
// Train
// ============================================================================

/// Fits the cost-growth model from the processed feature table.
pub struct TrainStage;

impl TrainStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrainStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for TrainStage {
    fn id(&self) -> StageId {
        StageId::Train
    }

    fn inputs(&self) -> Vec<ArtifactKey> {
        vec![feature_table_key()]
    }

    fn outputs(&self) -> Vec<ArtifactKey> {
        vec![model_key()]
    }

    async fn execute(&self, store: &ArtifactStore) -> Result<Vec<Artifact>, StageError> {
        let features_artifact = store.get(feature_table_key()).await.map_err(|e| match e {
            StorageError::NotFound(_) => StageError::Model(ModelError::MissingInput(e)),
            other => StageError::Storage(other),
        })?;
        let bytes = store
            .read_file(&features_artifact, FEATURES_FILENAME)
            .await?;
        let features = FeatureTable::from_csv(&bytes).map_err(ModelError::from)?;

        let model = ModelTrainer::new().train(&features)?;
        let payload =
            ArtifactPayload::single(MODEL_FILENAME, model.to_json().map_err(ModelError::from)?);

        let provenance =
            Provenance::new().with_input(feature_table_key(), features_artifact.fingerprint());
        let artifact = store.put(model_key(), payload, provenance).await?;
        Ok(vec![artifact])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CostGrowthModel;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_generate_stage_publishes_raw_dataset() {
        let (_dir, store) = test_store();
        let params = GenerationParams::new(42, 3);
        let stage = GenerateStage::new(params);

        let artifacts = stage.execute(&store).await.expect("stage should succeed");
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].key, raw_dataset_key());
        assert_eq!(
            artifacts[0].manifest.provenance.params.as_deref(),
            Some(params.fingerprint().as_str())
        );
        assert!(store.exists(raw_dataset_key()).await);
    }

    #[tokio::test]
    async fn test_profile_stage_requires_raw_dataset() {
        let (_dir, store) = test_store();

        match ProfileStage::new().execute(&store).await {
            Err(StageError::Profiling(ProfilingError::MissingInput(_))) => {}
            other => panic!("expected MissingInput, got {:?}", other.is_ok()),
        }
        assert!(!store.exists(profile_report_key()).await);
    }

    #[tokio::test]
    async fn test_train_stage_requires_feature_table() {
        let (_dir, store) = test_store();

        assert!(matches!(
            TrainStage::new().execute(&store).await,
            Err(StageError::Model(ModelError::MissingInput(_)))
        ));
    }

    #[tokio::test]
    async fn test_stages_chain_with_recorded_provenance() {
        let (_dir, store) = test_store();
        let params = GenerationParams::new(42, 40);

        let raw = GenerateStage::new(params)
            .execute(&store)
            .await
            .expect("generate should succeed")
            .remove(0);
        let report = ProfileStage::new()
            .execute(&store)
            .await
            .expect("profile should succeed")
            .remove(0);
        let features = FeatureStage::new()
            .execute(&store)
            .await
            .expect("features should succeed");
        let model_artifact = TrainStage::new()
            .execute(&store)
            .await
            .expect("train should succeed")
            .remove(0);

        assert_eq!(
            report.manifest.provenance.input_fingerprint(raw_dataset_key()),
            Some(raw.fingerprint())
        );
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].key, prepared_table_key());
        assert_eq!(features[1].key, feature_table_key());
        assert_eq!(
            features[1]
                .manifest
                .provenance
                .input_fingerprint(raw_dataset_key()),
            Some(raw.fingerprint())
        );
        assert_eq!(
            model_artifact
                .manifest
                .provenance
                .input_fingerprint(feature_table_key()),
            Some(features[1].fingerprint())
        );

        let bytes = store
            .read_file(&model_artifact, MODEL_FILENAME)
            .await
            .expect("model file should read");
        let model = CostGrowthModel::from_json(&bytes).expect("model should parse");
        assert_eq!(model.trained_rows, 40);
    }
}
