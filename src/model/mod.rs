//! Cost-growth regression over the derived feature table.
//!
//! Fits an ordinary least squares model predicting the value-growth ratio
//! from the normalized predictors. The fit goes through the normal
//! equations: the Gram matrix is assembled with `ndarray` and solved by
//! Gaussian elimination with partial pivoting, which keeps the trainer free
//! of external solver dependencies while staying exact for the small
//! systems involved.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::features::{FeatureTable, TARGET_COLUMN};

/// File name of the serialized model inside its artifact.
pub const MODEL_FILENAME: &str = "cost_growth_model.json";

/// Pivots below this magnitude mark the normal matrix as singular.
const PIVOT_EPSILON: f64 = 1e-10;

/// A fitted linear model with its training-set fit statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostGrowthModel {
    /// Name of the predicted column.
    pub target: String,
    pub intercept: f64,
    /// Coefficient per predictor, keyed by feature name.
    pub coefficients: BTreeMap<String, f64>,
    pub r_squared: f64,
    pub rmse: f64,
    pub trained_rows: usize,
    pub trained_at: DateTime<Utc>,
}

impl CostGrowthModel {
    /// Predicts the target for one row of named feature values.
    ///
    /// Names absent from the model contribute nothing.
    pub fn predict(&self, names: &[String], values: &[f64]) -> f64 {
        let mut prediction = self.intercept;
        for (name, value) in names.iter().zip(values) {
            if let Some(coefficient) = self.coefficients.get(name) {
                prediction += coefficient * value;
            }
        }
        prediction
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Fits cost-growth models from feature tables.
#[derive(Debug, Default)]
pub struct ModelTrainer;

impl ModelTrainer {
    pub fn new() -> Self {
        Self
    }

    /// Fits the model on every row of the feature table.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::TooFewRows` when the table has fewer rows than
    /// the design matrix has columns, and `ModelError::Degenerate` when the
    /// normal equations cannot be solved.
    pub fn train(&self, features: &FeatureTable) -> Result<CostGrowthModel, ModelError> {
        let rows = features.row_count();
        let columns = features.feature_names.len() + 1;
        if rows < columns {
            return Err(ModelError::TooFewRows { rows, columns });
        }

        let mut design = Array2::zeros((rows, columns));
        let mut response = Array1::zeros(rows);
        for (i, row) in features.rows.iter().enumerate() {
            design[[i, 0]] = 1.0;
            for (j, &value) in row.iter().enumerate() {
                design[[i, j + 1]] = value;
            }
            response[i] = features.targets[i];
        }

        let gram = design.t().dot(&design);
        let moment = design.t().dot(&response);
        let beta = solve(gram, moment)?;

        let fitted = design.dot(&beta);
        let mean = response.sum() / rows as f64;
        let mut residual_sq = 0.0;
        let mut total_sq = 0.0;
        for i in 0..rows {
            residual_sq += (response[i] - fitted[i]).powi(2);
            total_sq += (response[i] - mean).powi(2);
        }
        if total_sq < PIVOT_EPSILON {
            return Err(ModelError::Degenerate(
                "target column has zero variance".to_string(),
            ));
        }

        let rmse = (residual_sq / rows as f64).sqrt();
        let r_squared = 1.0 - residual_sq / total_sq;

        let coefficients = features
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| (name.clone(), beta[j + 1]))
            .collect();

        tracing::info!(rows, r_squared, rmse, "Fitted cost-growth model");

        Ok(CostGrowthModel {
            target: TARGET_COLUMN.to_string(),
            intercept: beta[0],
            coefficients,
            r_squared,
            rmse,
            trained_rows: rows,
            trained_at: Utc::now(),
        })
    }
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, ModelError> {
    let n = b.len();
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_mag = a[[col, col]].abs();
        for row in col + 1..n {
            let mag = a[[row, col]].abs();
            if mag > pivot_mag {
                pivot_row = row;
                pivot_mag = mag;
            }
        }
        if pivot_mag < PIVOT_EPSILON {
            return Err(ModelError::Degenerate(format!(
                "normal matrix is singular at column {}",
                col
            )));
        }
        if pivot_row != col {
            for k in col..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for col in (0..n).rev() {
        let mut sum = b[col];
        for k in col + 1..n {
            sum -= a[[col, k]] * x[k];
        }
        x[col] = sum / a[[col, col]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetGenerator, GenerationParams};
    use crate::features::FeatureBuilder;

    fn synthetic_table(names: &[&str], rows: Vec<Vec<f64>>, targets: Vec<f64>) -> FeatureTable {
        FeatureTable {
            contract_ids: (1..=rows.len()).map(|i| format!("CTR-{:06}", i)).collect(),
            feature_names: names.iter().map(|n| n.to_string()).collect(),
            targets,
            rows,
        }
    }

    #[test]
    fn test_recovers_known_coefficients() {
        // target = 2 + 3a - 1.5b, exactly.
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![0.5, 0.25],
        ];
        let targets = rows.iter().map(|r| 2.0 + 3.0 * r[0] - 1.5 * r[1]).collect();
        let table = synthetic_table(&["a", "b"], rows, targets);

        let model = ModelTrainer::new().train(&table).expect("fit should succeed");
        assert!((model.intercept - 2.0).abs() < 1e-8);
        assert!((model.coefficients["a"] - 3.0).abs() < 1e-8);
        assert!((model.coefficients["b"] + 1.5).abs() < 1e-8);
        assert!((model.r_squared - 1.0).abs() < 1e-8);
        assert!(model.rmse < 1e-8);
        assert_eq!(model.trained_rows, 6);
    }

    #[test]
    fn test_prediction_applies_coefficients() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![2.0, 1.0],
        ];
        let targets = rows.iter().map(|r| 1.0 + 2.0 * r[0] + 4.0 * r[1]).collect();
        let table = synthetic_table(&["a", "b"], rows, targets);
        let model = ModelTrainer::new().train(&table).expect("fit should succeed");

        let names: Vec<String> = vec!["a".to_string(), "b".to_string()];
        let prediction = model.predict(&names, &[3.0, 0.5]);
        assert!((prediction - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_too_few_rows_is_rejected() {
        let table = synthetic_table(
            &["a", "b", "c"],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            vec![1.0, 2.0],
        );
        match ModelTrainer::new().train(&table) {
            Err(ModelError::TooFewRows { rows, columns }) => {
                assert_eq!(rows, 2);
                assert_eq!(columns, 4);
            }
            other => panic!("expected TooFewRows, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_collinear_features_are_degenerate() {
        // Second column duplicates the first.
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ];
        let targets = vec![0.0, 1.0, 2.0, 3.0];
        let table = synthetic_table(&["a", "a_copy"], rows, targets);

        assert!(matches!(
            ModelTrainer::new().train(&table),
            Err(ModelError::Degenerate(_))
        ));
    }

    #[test]
    fn test_constant_target_is_degenerate() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0]];
        let table = synthetic_table(&["a"], rows, vec![5.0, 5.0, 5.0]);

        assert!(matches!(
            ModelTrainer::new().train(&table),
            Err(ModelError::Degenerate(_))
        ));
    }

    #[test]
    fn test_fits_generated_features() {
        let dataset = DatasetGenerator::with_default_schema()
            .generate(&GenerationParams::new(42, 30))
            .expect("generation should succeed");
        let build = FeatureBuilder::new()
            .build(&dataset)
            .expect("build should succeed");

        let model = ModelTrainer::new()
            .train(&build.features)
            .expect("fit should succeed");
        assert_eq!(model.coefficients.len(), build.features.feature_names.len());
        assert!(model.rmse >= 0.0);
        assert!(model.r_squared <= 1.0 + 1e-9);
        assert!(model.r_squared >= -1e-9);
        assert_eq!(model.trained_rows, 30);
    }

    #[test]
    fn test_model_json_roundtrip() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 2.0],
        ];
        let targets = rows.iter().map(|r| 0.5 + r[0] - r[1]).collect();
        let table = synthetic_table(&["a", "b"], rows, targets);
        let model = ModelTrainer::new().train(&table).expect("fit should succeed");

        let bytes = model.to_json().expect("serialize should succeed");
        let restored = CostGrowthModel::from_json(&bytes).expect("parse should succeed");
        assert_eq!(restored.target, model.target);
        assert_eq!(restored.coefficients, model.coefficients);
        assert!((restored.intercept - model.intercept).abs() < 1e-12);
        assert_eq!(restored.trained_rows, model.trained_rows);
    }
}
