//! Per-column descriptive statistics over the raw dataset.
//!
//! The profiler walks the declared schema and computes, for every column,
//! cardinality and null rate plus a kind-specific block: summary statistics
//! and quartiles for numeric columns, per-category frequencies for
//! categorical columns, and the date range for temporal columns. Empty cells
//! are the null representation and are excluded from the kind-specific
//! statistics. The profiler never mutates the dataset it reads.

pub mod report;

pub use report::{ColumnProfile, NumericProfile, ProfileReport, TableProfile, TemporalProfile};

use std::collections::{BTreeMap, HashSet};

/// File name of the serialized report inside its artifact.
pub const REPORT_FILENAME: &str = "profile_report.json";

use chrono::{NaiveDate, Utc};

use crate::dataset::{ColumnKind, Dataset, DatasetSchema, Table, TableSchema};
use crate::error::ProfilingError;

/// Computes profiling reports for datasets of a declared schema.
pub struct Profiler {
    schema: DatasetSchema,
}

impl Profiler {
    pub fn new(schema: DatasetSchema) -> Self {
        Self { schema }
    }

    pub fn with_default_schema() -> Self {
        Self::new(crate::dataset::default_schema())
    }

    /// Profiles every declared table of the dataset.
    ///
    /// # Errors
    ///
    /// Returns `ProfilingError::EmptyDataset` when a declared table is absent
    /// or has no rows, and `ProfilingError::MalformedValue` when a cell
    /// cannot be read as its column's declared kind.
    pub fn profile(&self, dataset: &Dataset) -> Result<ProfileReport, ProfilingError> {
        let mut tables = Vec::with_capacity(self.schema.tables.len());
        for table_schema in &self.schema.tables {
            let table = dataset
                .table(&table_schema.name)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ProfilingError::EmptyDataset(table_schema.name.clone()))?;
            tables.push(profile_table(table_schema, table)?);
        }

        let report = ProfileReport {
            generated_at: Utc::now(),
            params: dataset.params,
            row_counts: dataset.row_counts(),
            tables,
        };

        tracing::info!(
            tables = report.tables.len(),
            total_rows = report.row_counts.values().sum::<usize>(),
            "Profiled dataset"
        );
        Ok(report)
    }
}

fn profile_table(
    table_schema: &TableSchema,
    table: &Table,
) -> Result<TableProfile, ProfilingError> {
    let mut columns = Vec::with_capacity(table_schema.columns.len());
    for column_schema in &table_schema.columns {
        let index = table.column_index(&column_schema.name).ok_or_else(|| {
            ProfilingError::MalformedValue {
                column: column_schema.name.clone(),
                value: String::new(),
                reason: format!("column not present in table '{}'", table.name),
            }
        })?;
        columns.push(profile_column(
            &column_schema.name,
            column_schema.kind,
            table,
            index,
        )?);
    }

    Ok(TableProfile {
        table: table.name.clone(),
        row_count: table.row_count(),
        columns,
    })
}

fn profile_column(
    name: &str,
    kind: ColumnKind,
    table: &Table,
    index: usize,
) -> Result<ColumnProfile, ProfilingError> {
    let mut distinct: HashSet<&str> = HashSet::new();
    let mut null_count = 0usize;
    for value in table.column_values(index) {
        if value.is_empty() {
            null_count += 1;
        } else {
            distinct.insert(value);
        }
    }

    let row_count = table.row_count();
    let mut profile = ColumnProfile {
        name: name.to_string(),
        kind,
        cardinality: distinct.len(),
        null_count,
        null_rate: null_count as f64 / row_count as f64,
        numeric: None,
        categories: None,
        temporal: None,
    };

    match kind {
        ColumnKind::Numeric => {
            profile.numeric = numeric_profile(name, table, index)?;
        }
        ColumnKind::Categorical => {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for value in table.column_values(index) {
                if !value.is_empty() {
                    *counts.entry(value.to_string()).or_insert(0) += 1;
                }
            }
            profile.categories = Some(counts);
        }
        ColumnKind::Temporal => {
            profile.temporal = temporal_profile(name, table, index)?;
        }
        ColumnKind::Identifier | ColumnKind::Text => {}
    }

    Ok(profile)
}

fn numeric_profile(
    name: &str,
    table: &Table,
    index: usize,
) -> Result<Option<NumericProfile>, ProfilingError> {
    let mut values = Vec::with_capacity(table.row_count());
    for cell in table.column_values(index) {
        if cell.is_empty() {
            continue;
        }
        let value: f64 = cell.parse().map_err(|_| ProfilingError::MalformedValue {
            column: name.to_string(),
            value: cell.to_string(),
            reason: "expected a numeric value".to_string(),
        })?;
        if !value.is_finite() {
            return Err(ProfilingError::MalformedValue {
                column: name.to_string(),
                value: cell.to_string(),
                reason: "expected a finite numeric value".to_string(),
            });
        }
        values.push(value);
    }
    if values.is_empty() {
        return Ok(None);
    }

    values.sort_by(f64::total_cmp);
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(Some(NumericProfile {
        min: values[0],
        max: values[values.len() - 1],
        mean,
        std_dev: variance.sqrt(),
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.50),
        p75: quantile(&values, 0.75),
    }))
}

/// Linear-interpolation quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let fraction = position - lower as f64;
    if lower + 1 >= sorted.len() {
        return sorted[sorted.len() - 1];
    }
    sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower])
}

fn temporal_profile(
    name: &str,
    table: &Table,
    index: usize,
) -> Result<Option<TemporalProfile>, ProfilingError> {
    let mut min: Option<NaiveDate> = None;
    let mut max: Option<NaiveDate> = None;
    for cell in table.column_values(index) {
        if cell.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(cell, "%Y-%m-%d").map_err(|_| {
            ProfilingError::MalformedValue {
                column: name.to_string(),
                value: cell.to_string(),
                reason: "expected a YYYY-MM-DD date".to_string(),
            }
        })?;
        min = Some(min.map_or(date, |d| d.min(date)));
        max = Some(max.map_or(date, |d| d.max(date)));
    }
    Ok(match (min, max) {
        (Some(min), Some(max)) => Some(TemporalProfile { min, max }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::schema::{TABLE_CONTRACTS, TABLE_DELIVERABLES};
    use crate::dataset::{default_schema, DatasetGenerator, GenerationParams};

    fn generated_dataset() -> Dataset {
        DatasetGenerator::with_default_schema()
            .generate(&GenerationParams::new(42, 5))
            .expect("generation should succeed")
    }

    #[test]
    fn test_profile_covers_every_declared_column() {
        let schema = default_schema();
        let report = Profiler::with_default_schema()
            .profile(&generated_dataset())
            .expect("profiling should succeed");

        assert_eq!(report.tables.len(), schema.tables.len());
        for table_schema in &schema.tables {
            let table_profile = report.table(&table_schema.name).expect("table profiled");
            assert_eq!(table_profile.columns.len(), table_schema.columns.len());
            for column in &table_schema.columns {
                assert!(table_profile.column(&column.name).is_some());
            }
        }
    }

    #[test]
    fn test_profile_numeric_and_temporal_blocks() {
        let report = Profiler::with_default_schema()
            .profile(&generated_dataset())
            .expect("profiling should succeed");

        let contracts = report.table(TABLE_CONTRACTS).unwrap();
        assert_eq!(contracts.row_count, 5);

        let value = contracts.column("original_value").unwrap();
        let numeric = value.numeric.as_ref().expect("numeric block present");
        assert!(numeric.min >= 100_000.0);
        assert!(numeric.max < 50_000_000.0);
        assert!(numeric.min <= numeric.p25 && numeric.p25 <= numeric.p50);
        assert!(numeric.p50 <= numeric.p75 && numeric.p75 <= numeric.max);
        assert_eq!(value.null_count, 0);

        let start = contracts.column("start_date").unwrap();
        let temporal = start.temporal.as_ref().expect("temporal block present");
        assert!(temporal.min <= temporal.max);

        let status = contracts.column("status").unwrap();
        let categories = status.categories.as_ref().expect("categories present");
        assert_eq!(categories.values().sum::<usize>(), 5);
    }

    #[test]
    fn test_profile_counts_empty_cells_as_nulls() {
        let report = Profiler::with_default_schema()
            .profile(&generated_dataset())
            .expect("profiling should succeed");

        let deliverables = report.table(TABLE_DELIVERABLES).unwrap();
        let delivery = deliverables.column("delivery_date").unwrap();
        assert_eq!(
            delivery.null_rate,
            delivery.null_count as f64 / deliverables.row_count as f64
        );
        assert!(delivery.cardinality <= deliverables.row_count - delivery.null_count);
    }

    #[test]
    fn test_profile_report_json_roundtrip() {
        let report = Profiler::with_default_schema()
            .profile(&generated_dataset())
            .expect("profiling should succeed");
        let bytes = report.to_json().unwrap();
        let parsed = ProfileReport::from_json(&bytes).unwrap();
        assert_eq!(parsed.params, report.params);
        assert_eq!(parsed.row_counts, report.row_counts);
        assert_eq!(parsed.tables.len(), report.tables.len());
    }

    #[test]
    fn test_empty_table_rejected() {
        let schema = default_schema();
        let contracts_schema = schema.table(TABLE_CONTRACTS).unwrap();
        let empty = Table::new(TABLE_CONTRACTS, contracts_schema.column_names());
        let dataset = Dataset::new(GenerationParams::new(1, 1), vec![empty]);

        assert!(matches!(
            Profiler::new(schema).profile(&dataset),
            Err(ProfilingError::EmptyDataset(table)) if table == TABLE_CONTRACTS
        ));
    }

    #[test]
    fn test_malformed_numeric_cell_rejected() {
        let schema = default_schema();
        let contracts_schema = schema.table(TABLE_CONTRACTS).unwrap();
        let mut table = Table::new(TABLE_CONTRACTS, contracts_schema.column_names());
        let mut row: Vec<String> = contracts_schema
            .column_names()
            .iter()
            .map(|_| "x".to_string())
            .collect();
        let value_idx = table.column_index("original_value").unwrap();
        row[value_idx] = "not-a-number".to_string();
        // Dates must parse so the failure lands on the numeric column.
        let start_idx = table.column_index("start_date").unwrap();
        let end_idx = table.column_index("end_date").unwrap();
        row[start_idx] = "2020-01-01".to_string();
        row[end_idx] = "2021-01-01".to_string();
        table.push_row(row);

        let dataset = Dataset::new(GenerationParams::new(1, 1), vec![table]);
        match Profiler::new(schema).profile(&dataset) {
            Err(ProfilingError::MalformedValue { column, value, .. }) => {
                assert_eq!(column, "original_value");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected MalformedValue, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_quantile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), 1.75);
        assert_eq!(quantile(&values, 0.50), 2.5);
        assert_eq!(quantile(&values, 0.75), 3.25);
        assert_eq!(quantile(&[7.0], 0.5), 7.0);
    }

    #[test]
    fn test_population_std_dev() {
        let schema = default_schema();
        let contracts_schema = schema.table(TABLE_CONTRACTS).unwrap();
        let mut table = Table::new(TABLE_CONTRACTS, contracts_schema.column_names());
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            let mut row: Vec<String> = contracts_schema
                .column_names()
                .iter()
                .map(|_| String::new())
                .collect();
            row[table.column_index("contract_id").unwrap()] = format!("CTR-{}", value);
            row[table.column_index("original_value").unwrap()] = value.to_string();
            row[table.column_index("current_value").unwrap()] = value.to_string();
            table.push_row(row);
        }

        let profile = numeric_profile(
            "original_value",
            &table,
            table.column_index("original_value").unwrap(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(profile.mean, 5.0);
        assert_eq!(profile.std_dev, 2.0);
    }
}
