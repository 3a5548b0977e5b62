//! Categorical lookup flavor.

use crate::error::BundleResult;
use crate::loader::Flavor;
use anvil_abstraction::{Frame, LoadContext, PredictError, Predictor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Flavor id for embedded lookup models.
pub const LOOKUP_FLAVOR: &str = "lookup";

/// A categorical score table with a default fallback.
///
/// Its native "inference method" is a table probe rather than a literal
/// predict; the adapter maps it onto the uniform contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupModel {
    /// Input column holding the category key.
    pub key_column: String,
    /// Score per known key.
    pub scores: BTreeMap<String, f64>,
    /// Score returned for unknown keys.
    pub default_score: f64,
}

impl LookupModel {
    #[must_use]
    pub fn new(
        key_column: impl Into<String>,
        scores: BTreeMap<String, f64>,
        default_score: f64,
    ) -> Self {
        Self { key_column: key_column.into(), scores, default_score }
    }

    /// Serializes the model into embedded adapter state.
    pub fn state(&self) -> BundleResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Predictor for LookupModel {
    fn predict(&self, input: &Frame) -> Result<Frame, PredictError> {
        let col = input.column_index(&self.key_column).ok_or_else(|| {
            PredictError::Inference(format!("missing key column '{}'", self.key_column))
        })?;

        let mut rows = Vec::with_capacity(input.num_rows());
        for (row_idx, row) in input.rows.iter().enumerate() {
            // Deserialized frames can carry ragged rows; never index past
            // the row.
            let cell = row.get(col).ok_or_else(|| {
                PredictError::InvalidFrame(format!(
                    "row {row_idx} has {} cells, expected {}",
                    row.len(),
                    input.columns.len()
                ))
            })?;
            let key = cell.as_str().ok_or_else(|| {
                PredictError::Inference(format!(
                    "row {row_idx}: key cell {cell} is not a string"
                ))
            })?;
            let score = self.scores.get(key).copied().unwrap_or(self.default_score);
            rows.push(vec![json!(score)]);
        }

        Ok(Frame { columns: vec!["score".to_string()], rows })
    }
}

/// Flavor reconstructing embedded lookup models.
pub struct LookupFlavor;

impl Flavor for LookupFlavor {
    fn id(&self) -> &'static str {
        LOOKUP_FLAVOR
    }

    fn load_embedded(
        &self,
        state: &Value,
        _ctx: &LoadContext,
    ) -> BundleResult<Box<dyn Predictor>> {
        let model: LookupModel = serde_json::from_value(state.clone())?;
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LookupModel {
        let mut scores = BTreeMap::new();
        scores.insert("gold".to_string(), 0.9);
        scores.insert("silver".to_string(), 0.5);
        LookupModel::new("tier", scores, 0.1)
    }

    #[test]
    fn test_lookup_with_default() {
        let input = Frame::new(
            vec!["tier".to_string()],
            vec![vec![json!("gold")], vec![json!("bronze")]],
        )
        .unwrap();

        let output = model().predict(&input).unwrap();
        assert_eq!(output.columns, vec!["score"]);
        assert_eq!(output.rows, vec![vec![json!(0.9)], vec![json!(0.1)]]);
    }

    #[test]
    fn test_lookup_rejects_non_string_key() {
        let input = Frame::new(vec!["tier".to_string()], vec![vec![json!(3)]]).unwrap();
        let err = model().predict(&input).unwrap_err();
        assert!(matches!(err, PredictError::Inference(_)));
    }

    #[test]
    fn test_lookup_rejects_ragged_deserialized_frame() {
        let input: Frame =
            serde_json::from_str(r#"{"columns": ["tier"], "rows": [[]]}"#).unwrap();
        let err = model().predict(&input).unwrap_err();
        assert!(matches!(err, PredictError::InvalidFrame(_)));
    }

    #[test]
    fn test_lookup_missing_key_column() {
        let input = Frame::empty(vec!["other".to_string()]);
        let err = model().predict(&input).unwrap_err();
        assert!(matches!(err, PredictError::Inference(_)));
    }
}
