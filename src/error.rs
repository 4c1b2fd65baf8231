//! Error types for cfa-forge operations.
//!
//! Defines error types for the pipeline subsystems:
//! - Dataset generation (parameters, schema)
//! - Data profiling
//! - Feature derivation
//! - Model training
//!
//! Storage, configuration and orchestrator errors live next to their
//! subsystems (`store`, `pipeline`).

use thiserror::Error;

/// Errors that can occur during dataset generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid dataset size {0}: must be at least 1 contract")]
    InvalidSize(usize),

    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    /// The generated tables could not be serialized for publishing.
    #[error("Dataset serialization failed: {0}")]
    Dataset(#[from] crate::dataset::DatasetError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::store::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during data profiling.
#[derive(Debug, Error)]
pub enum ProfilingError {
    /// The referenced dataset artifact is absent; the generator must run first.
    #[error("Missing input artifact: {0}")]
    MissingInput(#[source] crate::store::StorageError),

    #[error("Dataset is empty: table '{0}' has no rows")]
    EmptyDataset(String),

    #[error("Malformed value '{value}' in column '{column}': {reason}")]
    MalformedValue {
        column: String,
        value: String,
        reason: String,
    },

    /// The raw tables could not be re-read into a dataset.
    #[error("Malformed dataset: {0}")]
    Dataset(#[from] crate::dataset::DatasetError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::store::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during feature derivation.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The referenced dataset artifact is absent; the generator must run first.
    #[error("Missing input artifact: {0}")]
    MissingInput(#[source] crate::store::StorageError),

    #[error("Schema mismatch in table '{table}': missing columns {missing:?}")]
    SchemaMismatch { table: String, missing: Vec<String> },

    #[error("Precondition violated for contract '{contract_id}': {reason}")]
    Precondition { contract_id: String, reason: String },

    /// The raw tables could not be re-read into a dataset.
    #[error("Malformed dataset: {0}")]
    Dataset(#[from] crate::dataset::DatasetError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::store::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during model training.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The feature table artifact is absent; the feature builder must run first.
    #[error("Missing input artifact: {0}")]
    MissingInput(#[source] crate::store::StorageError),

    #[error("Too few rows to fit model: {rows} rows for {columns} coefficients")]
    TooFewRows { rows: usize, columns: usize },

    #[error("Degenerate normal equations: {0}")]
    Degenerate(String),

    /// The stored feature table could not be re-read.
    #[error("Malformed feature table: {0}")]
    Dataset(#[from] crate::dataset::DatasetError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::store::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
