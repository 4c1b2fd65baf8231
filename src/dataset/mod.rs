//! Synthetic contract-financial dataset: schema, generation, serialization.
//!
//! The dataset is a set of flat tables (contracts, vendors, projects,
//! transactions, modifications, deliverables, personnel) held in memory as
//! string-celled rows. Flat tables serialize to CSV; the vendors table
//! serializes to the nested JSON document its consumers expect. An empty cell
//! is the null representation throughout.

pub mod csv;
pub mod generator;
pub mod schema;

pub use generator::DatasetGenerator;
pub use schema::{default_schema, ColumnKind, DatasetSchema, TableFormat, TableSchema};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GenerationError;
use crate::store::{Artifact, ArtifactPayload, ArtifactStore, StorageError};

/// File inside the raw artifact that echoes the generation parameters.
pub const PARAMS_FILENAME: &str = "generation_params.json";

/// Errors raised while serializing or re-reading dataset tables.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// CSV-level failure for one table.
    #[error("table '{table}': {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::CsvError,
    },

    /// JSON-level failure for one table.
    #[error("JSON error in table '{table}': {source}")]
    Json {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    /// A serialized table's header does not match the declared columns.
    #[error("table '{table}' header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A cell cannot be represented in the table's serialized form.
    #[error("table '{table}', column '{column}': cannot represent value '{value}'")]
    Cell {
        table: String,
        column: String,
        value: String,
    },

    /// The raw artifact carries no generation-parameters file.
    #[error("raw artifact is missing {PARAMS_FILENAME}")]
    MissingParams,

    /// Store-level failure while reading table files.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ============================================================================
// Generation parameters
// ============================================================================

/// Parameters driving one dataset generation: the RNG seed and the contract
/// count. All other table sizes derive from the contract count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: u64,
    pub contract_count: usize,
}

impl GenerationParams {
    pub fn new(seed: u64, contract_count: usize) -> Self {
        Self {
            seed,
            contract_count,
        }
    }

    /// Checks the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidSize` when the contract count is zero.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.contract_count == 0 {
            return Err(GenerationError::InvalidSize(self.contract_count));
        }
        Ok(())
    }

    /// Stable fingerprint of the parameters, used for staleness checks.
    pub fn fingerprint(&self) -> String {
        crate::store::compute_checksum(
            format!("seed={};contracts={}", self.seed, self.contract_count).as_bytes(),
        )
    }

    pub fn vendor_count(&self) -> usize {
        (self.contract_count * 2 / 5).max(1)
    }

    pub fn project_count(&self) -> usize {
        (self.contract_count / 10).max(1)
    }

    pub fn transaction_count(&self) -> usize {
        self.contract_count * 100
    }

    pub fn modification_count(&self) -> usize {
        self.contract_count * 4
    }

    pub fn deliverable_count(&self) -> usize {
        self.contract_count * 10
    }

    /// Floor of 8 keeps the supervisor draw meaningful for tiny datasets.
    pub fn personnel_count(&self) -> usize {
        (self.contract_count * 2).max(8)
    }
}

// ============================================================================
// Tables
// ============================================================================

/// One flat table: named columns plus string-celled rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }
}

/// The in-memory dataset: generation parameters plus the generated tables.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub params: GenerationParams,
    tables: Vec<Table>,
}

impl Dataset {
    pub fn new(params: GenerationParams, tables: Vec<Table>) -> Self {
        Self { params, tables }
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Per-table row counts, sorted by table name.
    pub fn row_counts(&self) -> BTreeMap<String, usize> {
        self.tables
            .iter()
            .map(|t| (t.name.clone(), t.rows.len()))
            .collect()
    }

    /// Serializes every declared table (plus the parameter echo) into a store
    /// payload.
    pub fn to_payload(&self, schema: &DatasetSchema) -> Result<ArtifactPayload, DatasetError> {
        let mut payload = ArtifactPayload::new();
        for table_schema in &schema.tables {
            let table = self.table(&table_schema.name).ok_or_else(|| {
                DatasetError::HeaderMismatch {
                    table: table_schema.name.clone(),
                    expected: table_schema.column_names(),
                    found: Vec::new(),
                }
            })?;
            let bytes = serialize_table(table, table_schema.format)?;
            payload = payload.with_file(table_schema.file_name.clone(), bytes);
        }

        let params_json =
            serde_json::to_vec_pretty(&self.params).map_err(|e| DatasetError::Json {
                table: "generation_params".to_string(),
                source: e,
            })?;
        Ok(payload.with_file(PARAMS_FILENAME, params_json))
    }

    /// Reads a dataset back out of a published raw artifact.
    pub async fn from_artifact(
        store: &ArtifactStore,
        artifact: &Artifact,
        schema: &DatasetSchema,
    ) -> Result<Self, DatasetError> {
        let mut tables = Vec::with_capacity(schema.tables.len());
        for table_schema in &schema.tables {
            let bytes = store.read_file(artifact, &table_schema.file_name).await?;
            tables.push(parse_table(table_schema, &bytes)?);
        }

        if !artifact.manifest.files.contains_key(PARAMS_FILENAME) {
            return Err(DatasetError::MissingParams);
        }
        let params_bytes = store.read_file(artifact, PARAMS_FILENAME).await?;
        let params: GenerationParams =
            serde_json::from_slice(&params_bytes).map_err(|e| DatasetError::Json {
                table: "generation_params".to_string(),
                source: e,
            })?;

        Ok(Self { params, tables })
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Serializes one table to its declared format.
pub fn serialize_table(table: &Table, format: TableFormat) -> Result<Vec<u8>, DatasetError> {
    match format {
        TableFormat::Csv => Ok(csv::encode(&table.columns, &table.rows).into_bytes()),
        TableFormat::Json => {
            let records = vendors_from_table(table)?;
            serde_json::to_vec_pretty(&records).map_err(|e| DatasetError::Json {
                table: table.name.clone(),
                source: e,
            })
        }
    }
}

/// Parses serialized bytes back into a table, checking the header against the
/// declared columns.
pub fn parse_table(table_schema: &TableSchema, bytes: &[u8]) -> Result<Table, DatasetError> {
    let expected = table_schema.column_names();
    match table_schema.format {
        TableFormat::Csv => {
            let (header, rows) = csv::parse(bytes).map_err(|e| DatasetError::Csv {
                table: table_schema.name.clone(),
                source: e,
            })?;
            if header != expected {
                return Err(DatasetError::HeaderMismatch {
                    table: table_schema.name.clone(),
                    expected,
                    found: header,
                });
            }
            Ok(Table {
                name: table_schema.name.clone(),
                columns: header,
                rows,
            })
        }
        TableFormat::Json => {
            let records: Vec<VendorRecord> =
                serde_json::from_slice(bytes).map_err(|e| DatasetError::Json {
                    table: table_schema.name.clone(),
                    source: e,
                })?;
            let mut table = Table::new(table_schema.name.clone(), expected);
            for record in &records {
                table.push_row(record.to_row());
            }
            Ok(table)
        }
    }
}

// ============================================================================
// Vendor records (nested JSON form)
// ============================================================================

/// Past-performance block of a vendor record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastPerformance {
    pub on_time_delivery_rate: f64,
    pub quality_rating: f64,
    pub cost_variance: f64,
    pub contracts_completed: u32,
    pub avg_contract_value: f64,
}

/// Point-of-contact block of a vendor record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOfContact {
    pub name: String,
    pub title: String,
    pub phone: String,
    pub email: String,
}

/// A vendor as serialized in `vendors.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorRecord {
    pub vendor_id: String,
    pub name: String,
    pub duns_number: String,
    pub cage_code: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub size: String,
    pub categories: Vec<String>,
    pub socioeconomic: Vec<String>,
    pub annual_revenue: f64,
    pub year_established: u32,
    pub past_performance: PastPerformance,
    pub active_contracts: u32,
    pub point_of_contact: PointOfContact,
}

/// Separator used when flattening the vendor list fields into single cells.
const LIST_SEPARATOR: &str = "; ";

impl VendorRecord {
    /// Flattens the record into a row matching the declared vendors columns.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.vendor_id.clone(),
            self.name.clone(),
            self.duns_number.clone(),
            self.cage_code.clone(),
            self.address.clone(),
            self.city.clone(),
            self.state.clone(),
            self.zip_code.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.website.clone(),
            self.size.clone(),
            self.categories.join(LIST_SEPARATOR),
            self.socioeconomic.join(LIST_SEPARATOR),
            format!("{:.2}", self.annual_revenue),
            self.year_established.to_string(),
            format!("{:.2}", self.past_performance.on_time_delivery_rate),
            format!("{:.1}", self.past_performance.quality_rating),
            format!("{:.2}", self.past_performance.cost_variance),
            self.past_performance.contracts_completed.to_string(),
            format!("{:.2}", self.past_performance.avg_contract_value),
            self.active_contracts.to_string(),
            self.point_of_contact.name.clone(),
            self.point_of_contact.title.clone(),
            self.point_of_contact.phone.clone(),
            self.point_of_contact.email.clone(),
        ]
    }
}

/// Builds the flat vendors table from nested records.
pub fn vendors_to_table(records: &[VendorRecord], table_schema: &TableSchema) -> Table {
    let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
    for record in records {
        table.push_row(record.to_row());
    }
    table
}

/// Reconstructs nested vendor records from the flat table.
fn vendors_from_table(table: &Table) -> Result<Vec<VendorRecord>, DatasetError> {
    let cell = |row: &[String], column: &str| -> Result<String, DatasetError> {
        let index = table
            .column_index(column)
            .ok_or_else(|| DatasetError::HeaderMismatch {
                table: table.name.clone(),
                expected: vec![column.to_string()],
                found: table.columns.clone(),
            })?;
        Ok(row[index].clone())
    };
    let float_cell = |row: &[String], column: &str| -> Result<f64, DatasetError> {
        let value = cell(row, column)?;
        value.parse().map_err(|_| DatasetError::Cell {
            table: table.name.clone(),
            column: column.to_string(),
            value,
        })
    };
    let int_cell = |row: &[String], column: &str| -> Result<u32, DatasetError> {
        let value = cell(row, column)?;
        value.parse().map_err(|_| DatasetError::Cell {
            table: table.name.clone(),
            column: column.to_string(),
            value,
        })
    };
    let list_cell = |row: &[String], column: &str| -> Result<Vec<String>, DatasetError> {
        let value = cell(row, column)?;
        if value.is_empty() {
            return Ok(Vec::new());
        }
        Ok(value.split(LIST_SEPARATOR).map(String::from).collect())
    };

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        records.push(VendorRecord {
            vendor_id: cell(row, "vendor_id")?,
            name: cell(row, "name")?,
            duns_number: cell(row, "duns_number")?,
            cage_code: cell(row, "cage_code")?,
            address: cell(row, "address")?,
            city: cell(row, "city")?,
            state: cell(row, "state")?,
            zip_code: cell(row, "zip_code")?,
            phone: cell(row, "phone")?,
            email: cell(row, "email")?,
            website: cell(row, "website")?,
            size: cell(row, "size")?,
            categories: list_cell(row, "categories")?,
            socioeconomic: list_cell(row, "socioeconomic")?,
            annual_revenue: float_cell(row, "annual_revenue")?,
            year_established: int_cell(row, "year_established")?,
            past_performance: PastPerformance {
                on_time_delivery_rate: float_cell(row, "on_time_delivery_rate")?,
                quality_rating: float_cell(row, "quality_rating")?,
                cost_variance: float_cell(row, "cost_variance")?,
                contracts_completed: int_cell(row, "contracts_completed")?,
                avg_contract_value: float_cell(row, "avg_contract_value")?,
            },
            active_contracts: int_cell(row, "active_contracts")?,
            point_of_contact: PointOfContact {
                name: cell(row, "poc_name")?,
                title: cell(row, "poc_title")?,
                phone: cell(row, "poc_phone")?,
                email: cell(row, "poc_email")?,
            },
        });
    }
    Ok(records)
}
