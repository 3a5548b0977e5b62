//! Linear regression flavor.

use crate::error::{BundleError, BundleResult};
use crate::loader::Flavor;
use anvil_abstraction::{Frame, LoadContext, PredictError, Predictor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Flavor id for embedded linear models.
pub const LINEAR_FLAVOR: &str = "linear";

/// Loader id for linear models stored as a weights artifact.
pub const LINEAR_ARTIFACT_LOADER: &str = "linear_artifact";

/// A linear regression model: `prediction = intercept + Σ wᵢ·xᵢ`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Input column names, in weight order.
    pub features: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Creates a linear model.
    ///
    /// # Errors
    /// Returns `BundleError::InvalidManifest` if the weight and feature
    /// counts differ.
    pub fn new(features: Vec<String>, weights: Vec<f64>, intercept: f64) -> BundleResult<Self> {
        if features.len() != weights.len() {
            return Err(BundleError::InvalidManifest(format!(
                "linear model has {} features but {} weights",
                features.len(),
                weights.len()
            )));
        }
        Ok(Self { features, weights, intercept })
    }

    /// Serializes the model into embedded adapter state.
    pub fn state(&self) -> BundleResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reconstructs a model from embedded adapter state.
    pub fn from_state(state: &Value) -> BundleResult<Self> {
        let model: Self = serde_json::from_value(state.clone())?;
        Self::new(model.features, model.weights, model.intercept)
    }

    /// Reads a model from a JSON weights file.
    pub fn from_file(path: &Path) -> BundleResult<Self> {
        let bytes = std::fs::read(path)?;
        let model: Self = serde_json::from_slice(&bytes)?;
        Self::new(model.features, model.weights, model.intercept)
    }

    /// Writes the model as a JSON weights file.
    pub fn write_file(&self, path: &Path) -> BundleResult<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn predict(&self, input: &Frame) -> Result<Frame, PredictError> {
        let indices: Vec<usize> = self
            .features
            .iter()
            .map(|f| {
                input.column_index(f).ok_or_else(|| {
                    PredictError::Inference(format!("missing feature column '{f}'"))
                })
            })
            .collect::<Result<_, _>>()?;

        let mut rows = Vec::with_capacity(input.num_rows());
        for (row_idx, row) in input.rows.iter().enumerate() {
            let mut y = self.intercept;
            for (weight, &col) in self.weights.iter().zip(&indices) {
                // Deserialized frames can carry ragged rows; never index
                // past the row.
                let cell = row.get(col).ok_or_else(|| {
                    PredictError::InvalidFrame(format!(
                        "row {row_idx} has {} cells, expected {}",
                        row.len(),
                        input.columns.len()
                    ))
                })?;
                let x = cell.as_f64().ok_or_else(|| {
                    PredictError::Inference(format!(
                        "row {row_idx}, column '{}': non-numeric cell {cell}",
                        input.columns[col]
                    ))
                })?;
                y += weight * x;
            }
            if !y.is_finite() {
                return Err(PredictError::Inference(format!(
                    "row {row_idx}: non-finite prediction"
                )));
            }
            rows.push(vec![json!(y)]);
        }

        Ok(Frame { columns: vec!["prediction".to_string()], rows })
    }
}

/// Flavor reconstructing embedded linear models.
pub struct LinearFlavor;

impl Flavor for LinearFlavor {
    fn id(&self) -> &'static str {
        LINEAR_FLAVOR
    }

    fn load_embedded(
        &self,
        state: &Value,
        _ctx: &LoadContext,
    ) -> BundleResult<Box<dyn Predictor>> {
        Ok(Box::new(LinearModel::from_state(state)?))
    }
}

/// Deferred loader for linear models logged as a weights artifact.
pub fn load_linear_artifact(data: &Path) -> BundleResult<Box<dyn Predictor>> {
    Ok(Box::new(LinearModel::from_file(data)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearModel {
        LinearModel::new(
            vec!["x1".to_string(), "x2".to_string()],
            vec![2.0, -1.0],
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn test_predict_math() {
        let input = Frame::new(
            vec!["x1".to_string(), "x2".to_string()],
            vec![vec![json!(1.0), json!(2.0)], vec![json!(0), json!(0)]],
        )
        .unwrap();

        let output = model().predict(&input).unwrap();
        assert_eq!(output.columns, vec!["prediction"]);
        assert_eq!(output.rows, vec![vec![json!(0.5)], vec![json!(0.5 + 0.0)]]);
    }

    #[test]
    fn test_predict_ignores_column_order() {
        // Features are matched by name, not position.
        let input = Frame::new(
            vec!["x2".to_string(), "x1".to_string()],
            vec![vec![json!(2.0), json!(1.0)]],
        )
        .unwrap();
        let output = model().predict(&input).unwrap();
        assert_eq!(output.rows[0][0], json!(0.5));
    }

    #[test]
    fn test_predict_missing_feature() {
        let input = Frame::new(vec!["x1".to_string()], vec![vec![json!(1.0)]]).unwrap();
        let err = model().predict(&input).unwrap_err();
        assert!(matches!(err, PredictError::Inference(_)));
    }

    #[test]
    fn test_predict_rejects_ragged_deserialized_frame() {
        // serde bypasses Frame::new's arity check, so predict must not
        // index past a short row.
        let input: Frame =
            serde_json::from_str(r#"{"columns": ["x1", "x2"], "rows": [[]]}"#).unwrap();
        let err = model().predict(&input).unwrap_err();
        assert!(matches!(err, PredictError::InvalidFrame(_)));
    }

    #[test]
    fn test_predict_non_numeric_cell() {
        let input = Frame::new(
            vec!["x1".to_string(), "x2".to_string()],
            vec![vec![json!("one"), json!(2.0)]],
        )
        .unwrap();
        let err = model().predict(&input).unwrap_err();
        assert!(matches!(err, PredictError::Inference(_)));
    }

    #[test]
    fn test_state_round_trip() {
        let m = model();
        let state = m.state().unwrap();
        let back = LinearModel::from_state(&state).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_mismatched_weight_count() {
        let err = LinearModel::new(vec!["x".to_string()], vec![1.0, 2.0], 0.0).unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("weights.json");
        model().write_file(&path).unwrap();
        let back = LinearModel::from_file(&path).unwrap();
        assert_eq!(back, model());
    }
}
