//! Declared shape of the synthetic contract-financial dataset.
//!
//! The schema names every table, its serialized form, and the kind of each
//! column. The generator emits tables in schema order, the profiler picks its
//! statistics per column kind, and the feature builder validates its declared
//! input columns against the schema before reading them.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

pub const TABLE_CONTRACTS: &str = "contracts";
pub const TABLE_VENDORS: &str = "vendors";
pub const TABLE_PROJECTS: &str = "projects";
pub const TABLE_TRANSACTIONS: &str = "transactions";
pub const TABLE_MODIFICATIONS: &str = "contract_modifications";
pub const TABLE_DELIVERABLES: &str = "deliverables";
pub const TABLE_PERSONNEL: &str = "personnel";

/// How a table is serialized in the raw tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Json,
}

/// Statistical kind of a column, driving which profile is computed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Formatted key or reference; profiled for cardinality only.
    Identifier,
    /// Closed vocabulary; profiled with per-category frequencies.
    Categorical,
    /// Parseable as f64; profiled with summary statistics and quantiles.
    Numeric,
    /// `YYYY-MM-DD` date; profiled for range, empty cells allowed.
    Temporal,
    /// Free text; profiled for cardinality only.
    Text,
}

/// One declared column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
}

/// One declared table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// File name inside the raw artifact, e.g. `contracts.csv`.
    pub file_name: String,
    pub format: TableFormat,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    fn new(name: &str, file_name: &str, format: TableFormat, columns: &[(&str, ColumnKind)]) -> Self {
        Self {
            name: name.to_string(),
            file_name: file_name.to_string(),
            format,
            columns: columns
                .iter()
                .map(|(name, kind)| ColumnSchema {
                    name: name.to_string(),
                    kind: *kind,
                })
                .collect(),
        }
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Kind of a column, if declared.
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
    }
}

/// The full declared table set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub tables: Vec<TableSchema>,
}

impl DatasetSchema {
    /// Looks up a table schema by name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Checks the schema is usable for generation.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MalformedSchema` for an empty table set,
    /// tables without columns, or duplicate table / file / column names.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.tables.is_empty() {
            return Err(GenerationError::MalformedSchema(
                "schema declares no tables".to_string(),
            ));
        }

        let mut table_names = std::collections::HashSet::new();
        let mut file_names = std::collections::HashSet::new();
        for table in &self.tables {
            if !table_names.insert(table.name.as_str()) {
                return Err(GenerationError::MalformedSchema(format!(
                    "duplicate table name '{}'",
                    table.name
                )));
            }
            if !file_names.insert(table.file_name.as_str()) {
                return Err(GenerationError::MalformedSchema(format!(
                    "duplicate table file name '{}'",
                    table.file_name
                )));
            }
            if table.columns.is_empty() {
                return Err(GenerationError::MalformedSchema(format!(
                    "table '{}' declares no columns",
                    table.name
                )));
            }
            let mut column_names = std::collections::HashSet::new();
            for column in &table.columns {
                if !column_names.insert(column.name.as_str()) {
                    return Err(GenerationError::MalformedSchema(format!(
                        "duplicate column '{}' in table '{}'",
                        column.name, table.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The stock contract-financial schema: seven related tables.
pub fn default_schema() -> DatasetSchema {
    use ColumnKind::*;

    DatasetSchema {
        tables: vec![
            TableSchema::new(
                TABLE_CONTRACTS,
                "contracts.csv",
                TableFormat::Csv,
                &[
                    ("contract_id", Identifier),
                    ("contract_number", Identifier),
                    ("vendor_id", Identifier),
                    ("project_id", Identifier),
                    ("contract_type", Categorical),
                    ("start_date", Temporal),
                    ("end_date", Temporal),
                    ("original_value", Numeric),
                    ("current_value", Numeric),
                    ("status", Categorical),
                    ("department", Categorical),
                    ("description", Text),
                    ("contracting_officer", Identifier),
                ],
            ),
            TableSchema::new(
                TABLE_VENDORS,
                "vendors.json",
                TableFormat::Json,
                &[
                    ("vendor_id", Identifier),
                    ("name", Text),
                    ("duns_number", Identifier),
                    ("cage_code", Identifier),
                    ("address", Text),
                    ("city", Text),
                    ("state", Categorical),
                    ("zip_code", Identifier),
                    ("phone", Text),
                    ("email", Text),
                    ("website", Text),
                    ("size", Categorical),
                    ("categories", Text),
                    ("socioeconomic", Text),
                    ("annual_revenue", Numeric),
                    ("year_established", Numeric),
                    ("on_time_delivery_rate", Numeric),
                    ("quality_rating", Numeric),
                    ("cost_variance", Numeric),
                    ("contracts_completed", Numeric),
                    ("avg_contract_value", Numeric),
                    ("active_contracts", Numeric),
                    ("poc_name", Text),
                    ("poc_title", Text),
                    ("poc_phone", Text),
                    ("poc_email", Text),
                ],
            ),
            TableSchema::new(
                TABLE_PROJECTS,
                "projects.csv",
                TableFormat::Csv,
                &[
                    ("project_id", Identifier),
                    ("name", Text),
                    ("type", Categorical),
                    ("description", Text),
                    ("start_date", Temporal),
                    ("end_date", Temporal),
                    ("total_budget", Numeric),
                    ("department", Categorical),
                    ("program_manager", Identifier),
                    ("priority", Categorical),
                ],
            ),
            TableSchema::new(
                TABLE_TRANSACTIONS,
                "transactions.csv",
                TableFormat::Csv,
                &[
                    ("transaction_id", Identifier),
                    ("contract_id", Identifier),
                    ("transaction_date", Temporal),
                    ("amount", Numeric),
                    ("type", Categorical),
                    ("description", Text),
                    ("fiscal_year", Numeric),
                    ("fiscal_quarter", Categorical),
                    ("invoice_number", Identifier),
                    ("approved_by", Identifier),
                ],
            ),
            TableSchema::new(
                TABLE_MODIFICATIONS,
                "contract_modifications.csv",
                TableFormat::Csv,
                &[
                    ("modification_id", Identifier),
                    ("contract_id", Identifier),
                    ("mod_number", Identifier),
                    ("mod_date", Temporal),
                    ("type", Categorical),
                    ("description", Text),
                    ("value_change", Numeric),
                    ("days_change", Numeric),
                    ("approved_by", Identifier),
                    ("status", Categorical),
                ],
            ),
            TableSchema::new(
                TABLE_DELIVERABLES,
                "deliverables.csv",
                TableFormat::Csv,
                &[
                    ("deliverable_id", Identifier),
                    ("contract_id", Identifier),
                    ("title", Text),
                    ("type", Categorical),
                    ("due_date", Temporal),
                    ("delivery_date", Temporal),
                    ("status", Categorical),
                    ("description", Text),
                    ("accepted", Categorical),
                    ("reviewer", Identifier),
                ],
            ),
            TableSchema::new(
                TABLE_PERSONNEL,
                "personnel.csv",
                TableFormat::Csv,
                &[
                    ("personnel_id", Identifier),
                    ("name", Text),
                    ("role", Categorical),
                    ("department", Categorical),
                    ("email", Text),
                    ("phone", Text),
                    ("security_clearance", Categorical),
                    ("hire_date", Temporal),
                    ("supervisor", Identifier),
                ],
            ),
        ],
    }
}
