//! Feature derivation over the raw dataset.
//!
//! The builder runs a fixed transformation pipeline, one output row per
//! contract: *prepare* joins per-contract aggregates from the transaction,
//! modification, and deliverable tables; *derive* computes the growth, spend,
//! and intensity measures; *encode* maps the categorical columns to their
//! vocabulary indices; *normalize* min-max scales the predictor columns
//! across the dataset. The prepared aggregate table is kept as an
//! intermediate output so reruns of downstream analysis can start from it.
//!
//! The only row filter is documented here: contracts whose start or end date
//! fails to parse are dropped and counted in `FeatureStats::dropped_rows`.
//! Generator-produced data never triggers it.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::generator::{CONTRACT_STATUS, CONTRACT_TYPES, DEPARTMENTS};
use crate::dataset::schema::{
    TABLE_CONTRACTS, TABLE_DELIVERABLES, TABLE_MODIFICATIONS, TABLE_TRANSACTIONS,
};
use crate::dataset::{csv, Dataset, DatasetError, Table};
use crate::error::FeatureError;

/// File name of the prepared aggregate table inside the interim artifact.
pub const PREPARED_FILENAME: &str = "prepared_contracts.csv";

/// File name of the feature table inside the processed artifact.
pub const FEATURES_FILENAME: &str = "features.csv";

/// File name of the build statistics inside the processed artifact.
pub const FEATURE_STATS_FILENAME: &str = "feature_stats.json";

/// Normalized predictor columns, in output order.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "duration_days",
    "transaction_count",
    "transaction_mean",
    "spend_ratio",
    "monthly_burn_rate",
    "modification_intensity",
    "deliverable_on_time_rate",
    "deliverable_late_count",
    "contract_type_code",
    "status_code",
    "department_code",
];

/// Unnormalized regression target: current value over original value.
pub const TARGET_COLUMN: &str = "value_growth";

/// Columns of the prepared per-contract aggregate table.
const PREPARED_COLUMNS: [&str; 18] = [
    "contract_id",
    "contract_type",
    "status",
    "department",
    "start_date",
    "end_date",
    "original_value",
    "current_value",
    "transaction_count",
    "transaction_total",
    "transaction_mean",
    "modification_count",
    "value_change_total",
    "days_change_total",
    "deliverable_count",
    "delivered_count",
    "on_time_rate",
    "late_count",
];

const DAYS_PER_MONTH: f64 = 30.44;
const DAYS_PER_YEAR: f64 = 365.25;

/// The derived feature table: one row per surviving contract.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub contract_ids: Vec<String>,
    /// Predictor names, matching the per-row value order.
    pub feature_names: Vec<String>,
    /// Raw value-growth target per row.
    pub targets: Vec<f64>,
    /// Normalized predictor values per row.
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Renders the table as CSV: contract id, target, then predictors.
    pub fn to_csv(&self) -> String {
        let mut columns = vec!["contract_id".to_string(), TARGET_COLUMN.to_string()];
        columns.extend(self.feature_names.iter().cloned());

        let rows: Vec<Vec<String>> = self
            .contract_ids
            .iter()
            .zip(self.targets.iter())
            .zip(self.rows.iter())
            .map(|((id, target), values)| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(id.clone());
                row.push(format!("{:.6}", target));
                row.extend(values.iter().map(|v| format!("{:.6}", v)));
                row
            })
            .collect();
        csv::encode(&columns, &rows)
    }

    /// Parses a feature table back from its CSV rendering.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, DatasetError> {
        let (header, rows) = csv::parse(bytes).map_err(|e| DatasetError::Csv {
            table: "features".to_string(),
            source: e,
        })?;
        if header.len() < 2 || header[0] != "contract_id" || header[1] != TARGET_COLUMN {
            return Err(DatasetError::HeaderMismatch {
                table: "features".to_string(),
                expected: vec!["contract_id".to_string(), TARGET_COLUMN.to_string()],
                found: header,
            });
        }

        let feature_names: Vec<String> = header[2..].to_vec();
        let mut contract_ids = Vec::with_capacity(rows.len());
        let mut targets = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let parse = |column: &str, cell: &str| -> Result<f64, DatasetError> {
                cell.parse().map_err(|_| DatasetError::Cell {
                    table: "features".to_string(),
                    column: column.to_string(),
                    value: cell.to_string(),
                })
            };
            contract_ids.push(row[0].clone());
            targets.push(parse(TARGET_COLUMN, &row[1])?);
            let mut numeric_row = Vec::with_capacity(feature_names.len());
            for (name, cell) in feature_names.iter().zip(&row[2..]) {
                numeric_row.push(parse(name, cell)?);
            }
            values.push(numeric_row);
        }

        Ok(Self {
            contract_ids,
            feature_names,
            targets,
            rows: values,
        })
    }
}

/// Min-max range a predictor column was scaled from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScalingRange {
    pub min: f64,
    pub max: f64,
}

/// Build statistics published alongside the feature table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub input_rows: usize,
    pub output_rows: usize,
    /// Contracts dropped by the date-parse filter.
    pub dropped_rows: usize,
    /// Pre-normalization range per predictor column.
    pub scaling: BTreeMap<String, ScalingRange>,
}

impl FeatureStats {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Everything one feature build produces: the prepared aggregate table for
/// the interim tier plus the feature table and its statistics for the
/// processed tier.
#[derive(Debug, Clone)]
pub struct FeatureBuild {
    pub prepared: Table,
    pub features: FeatureTable,
    pub stats: FeatureStats,
}

/// Per-contract working state accumulated during the prepare step.
struct ContractAggregate {
    contract_id: String,
    contract_type: String,
    status: String,
    department: String,
    start: NaiveDate,
    end: NaiveDate,
    original_value: f64,
    current_value: f64,
    transaction_count: usize,
    transaction_total: f64,
    modification_count: usize,
    value_change_total: f64,
    days_change_total: i64,
    deliverable_count: usize,
    delivered_count: usize,
    on_time_count: usize,
    late_count: usize,
}

impl ContractAggregate {
    fn transaction_mean(&self) -> f64 {
        if self.transaction_count == 0 {
            0.0
        } else {
            self.transaction_total / self.transaction_count as f64
        }
    }

    fn on_time_rate(&self) -> f64 {
        if self.delivered_count == 0 {
            0.0
        } else {
            self.on_time_count as f64 / self.delivered_count as f64
        }
    }

    fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Derives the feature table from a dataset.
#[derive(Debug, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Runs the prepare / derive / encode / normalize pipeline.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError::SchemaMismatch` when a declared input column is
    /// absent and `FeatureError::Precondition` when a contract violates a
    /// declared precondition (non-positive values, inverted date windows,
    /// values outside the encoding vocabularies).
    pub fn build(&self, dataset: &Dataset) -> Result<FeatureBuild, FeatureError> {
        let input_rows = dataset
            .table(TABLE_CONTRACTS)
            .map(Table::row_count)
            .unwrap_or(0);

        let mut aggregates = self.prepare_contracts(dataset)?;
        let dropped_rows = input_rows - aggregates.len();
        let index = index_by_contract(&aggregates);
        self.aggregate_transactions(dataset, &mut aggregates, &index)?;
        self.aggregate_modifications(dataset, &mut aggregates, &index)?;
        self.aggregate_deliverables(dataset, &mut aggregates, &index)?;

        let prepared = render_prepared(&aggregates);
        let (features, scaling) = derive_features(&aggregates)?;

        if dropped_rows > 0 {
            tracing::warn!(dropped_rows, "Dropped contracts with unparseable dates");
        }
        tracing::info!(
            input_rows,
            output_rows = features.row_count(),
            "Built feature table"
        );

        let stats = FeatureStats {
            input_rows,
            output_rows: features.row_count(),
            dropped_rows,
            scaling,
        };
        Ok(FeatureBuild {
            prepared,
            features,
            stats,
        })
    }

    /// Reads the contract rows into aggregates, applying the date filter.
    fn prepare_contracts(&self, dataset: &Dataset) -> Result<Vec<ContractAggregate>, FeatureError> {
        let (table, contracts) = require_columns(
            dataset,
            TABLE_CONTRACTS,
            &[
                "contract_id",
                "contract_type",
                "status",
                "department",
                "start_date",
                "end_date",
                "original_value",
                "current_value",
            ],
        )?;

        let mut aggregates = Vec::with_capacity(table.row_count());
        for row in &table.rows {
            let contract_id = row[contracts["contract_id"]].clone();

            // The one documented filter: rows with unparseable dates.
            let start = NaiveDate::parse_from_str(&row[contracts["start_date"]], "%Y-%m-%d");
            let end = NaiveDate::parse_from_str(&row[contracts["end_date"]], "%Y-%m-%d");
            let (start, end) = match (start, end) {
                (Ok(start), Ok(end)) => (start, end),
                _ => {
                    tracing::debug!(contract_id = %contract_id, "Dropping contract with bad dates");
                    continue;
                }
            };

            let original_value =
                parse_positive(&contract_id, "original_value", &row[contracts["original_value"]])?;
            let current_value =
                parse_positive(&contract_id, "current_value", &row[contracts["current_value"]])?;
            if end <= start {
                return Err(FeatureError::Precondition {
                    contract_id,
                    reason: "end_date does not follow start_date".to_string(),
                });
            }

            aggregates.push(ContractAggregate {
                contract_id,
                contract_type: row[contracts["contract_type"]].clone(),
                status: row[contracts["status"]].clone(),
                department: row[contracts["department"]].clone(),
                start,
                end,
                original_value,
                current_value,
                transaction_count: 0,
                transaction_total: 0.0,
                modification_count: 0,
                value_change_total: 0.0,
                days_change_total: 0,
                deliverable_count: 0,
                delivered_count: 0,
                on_time_count: 0,
                late_count: 0,
            });
        }
        Ok(aggregates)
    }

    fn aggregate_transactions(
        &self,
        dataset: &Dataset,
        aggregates: &mut [ContractAggregate],
        index: &HashMap<String, usize>,
    ) -> Result<(), FeatureError> {
        let (table, columns) =
            require_columns(dataset, TABLE_TRANSACTIONS, &["contract_id", "amount"])?;

        for row in &table.rows {
            // Rows referencing dropped or unknown contracts are ignored.
            let Some(&i) = index.get(row[columns["contract_id"]].as_str()) else {
                continue;
            };
            let contract_id = &aggregates[i].contract_id;
            let amount: f64 = row[columns["amount"]]
                .parse()
                .map_err(|_| FeatureError::Precondition {
                    contract_id: contract_id.clone(),
                    reason: format!(
                        "transaction amount '{}' is not numeric",
                        row[columns["amount"]]
                    ),
                })?;
            aggregates[i].transaction_count += 1;
            aggregates[i].transaction_total += amount;
        }
        Ok(())
    }

    fn aggregate_modifications(
        &self,
        dataset: &Dataset,
        aggregates: &mut [ContractAggregate],
        index: &HashMap<String, usize>,
    ) -> Result<(), FeatureError> {
        let (table, columns) = require_columns(
            dataset,
            TABLE_MODIFICATIONS,
            &["contract_id", "value_change", "days_change"],
        )?;

        for row in &table.rows {
            let Some(&i) = index.get(row[columns["contract_id"]].as_str()) else {
                continue;
            };
            let contract_id = aggregates[i].contract_id.clone();
            let parse_numeric = |column: &str| -> Result<f64, FeatureError> {
                row[columns[column]]
                    .parse()
                    .map_err(|_| FeatureError::Precondition {
                        contract_id: contract_id.clone(),
                        reason: format!(
                            "modification {} '{}' is not numeric",
                            column, row[columns[column]]
                        ),
                    })
            };
            let value_change = parse_numeric("value_change")?;
            let days_change = parse_numeric("days_change")? as i64;

            aggregates[i].modification_count += 1;
            aggregates[i].value_change_total += value_change;
            aggregates[i].days_change_total += days_change;
        }
        Ok(())
    }

    fn aggregate_deliverables(
        &self,
        dataset: &Dataset,
        aggregates: &mut [ContractAggregate],
        index: &HashMap<String, usize>,
    ) -> Result<(), FeatureError> {
        let (table, columns) = require_columns(
            dataset,
            TABLE_DELIVERABLES,
            &["contract_id", "due_date", "delivery_date"],
        )?;

        for row in &table.rows {
            let Some(&i) = index.get(row[columns["contract_id"]].as_str()) else {
                continue;
            };
            aggregates[i].deliverable_count += 1;

            let delivery_cell = &row[columns["delivery_date"]];
            if delivery_cell.is_empty() {
                continue;
            }
            // Undeliverable dates only degrade the on-time stats, they never
            // fail the build.
            let due = NaiveDate::parse_from_str(&row[columns["due_date"]], "%Y-%m-%d");
            let delivery = NaiveDate::parse_from_str(delivery_cell, "%Y-%m-%d");
            if let (Ok(due), Ok(delivery)) = (due, delivery) {
                aggregates[i].delivered_count += 1;
                if delivery <= due {
                    aggregates[i].on_time_count += 1;
                } else {
                    aggregates[i].late_count += 1;
                }
            }
        }
        Ok(())
    }
}

/// Resolves a table and its declared input columns, or reports what is
/// missing.
fn require_columns<'d>(
    dataset: &'d Dataset,
    table_name: &str,
    required: &[&str],
) -> Result<(&'d Table, HashMap<String, usize>), FeatureError> {
    let Some(table) = dataset.table(table_name) else {
        return Err(FeatureError::SchemaMismatch {
            table: table_name.to_string(),
            missing: required.iter().map(|c| c.to_string()).collect(),
        });
    };

    let mut indices = HashMap::with_capacity(required.len());
    let mut missing = Vec::new();
    for column in required {
        match table.column_index(column) {
            Some(index) => {
                indices.insert(column.to_string(), index);
            }
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(FeatureError::SchemaMismatch {
            table: table_name.to_string(),
            missing,
        });
    }
    Ok((table, indices))
}

/// Owned-key index, built once per build and shared by the aggregation
/// passes so they can mutate the aggregates while it is live.
fn index_by_contract(aggregates: &[ContractAggregate]) -> HashMap<String, usize> {
    aggregates
        .iter()
        .enumerate()
        .map(|(i, a)| (a.contract_id.clone(), i))
        .collect()
}

fn parse_positive(contract_id: &str, column: &str, cell: &str) -> Result<f64, FeatureError> {
    let value: f64 = cell.parse().map_err(|_| FeatureError::Precondition {
        contract_id: contract_id.to_string(),
        reason: format!("{} '{}' is not numeric", column, cell),
    })?;
    if value <= 0.0 {
        return Err(FeatureError::Precondition {
            contract_id: contract_id.to_string(),
            reason: format!("{} must be positive, got {}", column, value),
        });
    }
    Ok(value)
}

/// Renders the prepared per-contract aggregate table for the interim tier.
fn render_prepared(aggregates: &[ContractAggregate]) -> Table {
    let mut table = Table::new(
        "prepared_contracts",
        PREPARED_COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    for a in aggregates {
        table.push_row(vec![
            a.contract_id.clone(),
            a.contract_type.clone(),
            a.status.clone(),
            a.department.clone(),
            a.start.format("%Y-%m-%d").to_string(),
            a.end.format("%Y-%m-%d").to_string(),
            format!("{:.2}", a.original_value),
            format!("{:.2}", a.current_value),
            a.transaction_count.to_string(),
            format!("{:.2}", a.transaction_total),
            format!("{:.2}", a.transaction_mean()),
            a.modification_count.to_string(),
            format!("{:.2}", a.value_change_total),
            a.days_change_total.to_string(),
            a.deliverable_count.to_string(),
            a.delivered_count.to_string(),
            format!("{:.4}", a.on_time_rate()),
            a.late_count.to_string(),
        ]);
    }
    table
}

/// Derive, encode, and normalize: aggregates to the final feature table.
fn derive_features(
    aggregates: &[ContractAggregate],
) -> Result<(FeatureTable, BTreeMap<String, ScalingRange>), FeatureError> {
    let mut contract_ids = Vec::with_capacity(aggregates.len());
    let mut targets = Vec::with_capacity(aggregates.len());
    let mut rows = Vec::with_capacity(aggregates.len());

    for a in aggregates {
        let duration = a.duration_days() as f64;
        let row = vec![
            duration,
            a.transaction_count as f64,
            a.transaction_mean(),
            a.transaction_total / a.current_value,
            a.transaction_total * DAYS_PER_MONTH / duration,
            a.modification_count as f64 * DAYS_PER_YEAR / duration,
            a.on_time_rate(),
            a.late_count as f64,
            vocabulary_code(&a.contract_id, "contract_type", &a.contract_type, &CONTRACT_TYPES)?,
            vocabulary_code(&a.contract_id, "status", &a.status, &CONTRACT_STATUS)?,
            vocabulary_code(&a.contract_id, "department", &a.department, &DEPARTMENTS)?,
        ];
        contract_ids.push(a.contract_id.clone());
        targets.push(a.current_value / a.original_value);
        rows.push(row);
    }

    let scaling = normalize(&mut rows);
    Ok((
        FeatureTable {
            contract_ids,
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            targets,
            rows,
        },
        scaling,
    ))
}

/// Stable vocabulary index of a categorical value.
fn vocabulary_code(
    contract_id: &str,
    column: &str,
    value: &str,
    vocabulary: &[&str],
) -> Result<f64, FeatureError> {
    vocabulary
        .iter()
        .position(|v| *v == value)
        .map(|i| i as f64)
        .ok_or_else(|| FeatureError::Precondition {
            contract_id: contract_id.to_string(),
            reason: format!("unknown {} '{}'", column, value),
        })
}

/// Min-max scales each column in place; constant columns scale to zero.
fn normalize(rows: &mut [Vec<f64>]) -> BTreeMap<String, ScalingRange> {
    let mut scaling = BTreeMap::new();
    if rows.is_empty() {
        return scaling;
    }

    for (column, name) in FEATURE_COLUMNS.iter().enumerate() {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for row in rows.iter() {
            min = min.min(row[column]);
            max = max.max(row[column]);
        }
        scaling.insert(name.to_string(), ScalingRange { min, max });

        let span = max - min;
        for row in rows.iter_mut() {
            row[column] = if span > 0.0 {
                (row[column] - min) / span
            } else {
                0.0
            };
        }
    }
    scaling
}
