//! cfa-forge: Staged data pipeline for contract financial analysis.
//!
//! This library provides tools for generating synthetic contract datasets,
//! profiling them, deriving model-ready features, and fitting a cost growth
//! model, with every stage output published into a tiered artifact store.

// Core modules
pub mod cli;
pub mod dataset;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod store;

// Re-export commonly used error types
pub use error::{FeatureError, GenerationError, ModelError, ProfilingError};
pub use store::StorageError;
