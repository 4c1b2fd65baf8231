//! Profiling report structures serialized to the report tier.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::{ColumnKind, GenerationParams};

/// Summary statistics for a numeric column, computed over non-null cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericProfile {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

/// Date range of a temporal column, computed over non-null cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalProfile {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// Profile of one column.
///
/// Every column reports cardinality and null rate; the kind-specific block is
/// present when the column kind calls for it and at least one non-null cell
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Distinct non-null values.
    pub cardinality: usize,
    pub null_count: usize,
    pub null_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericProfile>,
    /// Per-category frequencies for categorical columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalProfile>,
}

/// Profile of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProfile {
    pub table: String,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    /// Looks up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The full profiling report for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    pub generated_at: DateTime<Utc>,
    /// Echo of the parameters the profiled dataset was generated with.
    pub params: GenerationParams,
    /// Per-table row counts, sorted by table name.
    pub row_counts: BTreeMap<String, usize>,
    pub tables: Vec<TableProfile>,
}

impl ProfileReport {
    /// Looks up a table profile by name.
    pub fn table(&self, name: &str) -> Option<&TableProfile> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
