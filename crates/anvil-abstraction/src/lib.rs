//! Predictor abstraction layer for Anvil.
//!
//! This module defines the core trait and types shared by every model
//! flavor: the tabular [`Frame`] exchanged with a model, the declared
//! [`Signature`] a bundle may carry, and the [`Predictor`] capability a
//! loaded bundle exposes.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Represents an error raised by a predictor or by frame validation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictError {
    /// The input or output frame does not conform to the declared signature.
    #[error("Signature Mismatch: {0}")]
    SignatureMismatch(String),

    /// A frame is structurally invalid (e.g., ragged rows).
    #[error("Invalid Frame: {0}")]
    InvalidFrame(String),

    /// The wrapped model failed during inference.
    #[error("Inference Error: {0}")]
    Inference(String),
}

/// A column-named, row-major table of JSON values.
///
/// Frames are the single input/output type of [`Predictor::predict`]. They
/// serialize as `{"columns": [...], "rows": [[...], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Row-major cell values; every row has one cell per column.
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Creates a frame, checking that every row has one cell per column.
    ///
    /// # Errors
    /// Returns `PredictError::InvalidFrame` if any row is ragged.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, PredictError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(PredictError::InvalidFrame(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Creates an empty frame with the given columns.
    #[must_use]
    pub fn empty(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Returns the index of the named column, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows in the frame.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Declared cell type for a signature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    String,
    Binary,
}

impl DType {
    /// Checks whether a JSON cell value conforms to this type.
    ///
    /// Validation is strict: nulls never conform, numbers are not coerced
    /// across kinds, and `Binary` cells must be valid base64 strings.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => value
                .as_i64()
                .is_some_and(|n| i32::try_from(n).is_ok()),
            Self::Long => value.as_i64().is_some(),
            Self::Float | Self::Double => value.is_number(),
            Self::String => value.is_string(),
            Self::Binary => value
                .as_str()
                .is_some_and(|s| base64::engine::general_purpose::STANDARD.decode(s).is_ok()),
        }
    }
}

/// A named, typed column in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Declared cell type.
    pub dtype: DType,
}

impl ColumnSpec {
    /// Creates a column spec.
    #[must_use]
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self { name: name.into(), dtype }
    }
}

/// Declared input/output shape of a model, validated at inference time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Columns the model consumes.
    pub inputs: Vec<ColumnSpec>,
    /// Columns the model produces.
    pub outputs: Vec<ColumnSpec>,
}

impl Signature {
    /// Creates a signature from input and output column specs.
    #[must_use]
    pub fn new(inputs: Vec<ColumnSpec>, outputs: Vec<ColumnSpec>) -> Self {
        Self { inputs, outputs }
    }

    /// Validates a frame against the declared input columns.
    ///
    /// # Errors
    /// Returns `PredictError::SignatureMismatch` if the frame's columns or
    /// cell types deviate from the declaration. Validation is fail-closed:
    /// extra columns, reordered columns, and nulls are all rejected.
    pub fn validate_input(&self, frame: &Frame) -> Result<(), PredictError> {
        Self::validate(frame, &self.inputs, "input")
    }

    /// Validates a frame against the declared output columns.
    ///
    /// # Errors
    /// Returns `PredictError::SignatureMismatch` on deviation.
    pub fn validate_output(&self, frame: &Frame) -> Result<(), PredictError> {
        Self::validate(frame, &self.outputs, "output")
    }

    fn validate(frame: &Frame, specs: &[ColumnSpec], side: &str) -> Result<(), PredictError> {
        let expected: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        let actual: Vec<&str> = frame.columns.iter().map(String::as_str).collect();
        if expected != actual {
            return Err(PredictError::SignatureMismatch(format!(
                "{side} columns {actual:?} do not match declared {expected:?}"
            )));
        }

        for (row_idx, row) in frame.rows.iter().enumerate() {
            if row.len() != specs.len() {
                return Err(PredictError::InvalidFrame(format!(
                    "{side} row {row_idx} has {} cells, expected {}",
                    row.len(),
                    specs.len()
                )));
            }
            for (spec, cell) in specs.iter().zip(row) {
                if !spec.dtype.matches(cell) {
                    return Err(PredictError::SignatureMismatch(format!(
                        "{side} row {row_idx}, column '{}': value {cell} is not a valid {:?}",
                        spec.name, spec.dtype
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Resolved filesystem context handed to a predictor after construction.
///
/// Maps every logical artifact name declared in the bundle manifest to an
/// absolute path that is known to exist.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Absolute path of the bundle directory.
    pub bundle_dir: PathBuf,
    /// Logical artifact name to resolved absolute path.
    pub artifacts: BTreeMap<String, PathBuf>,
}

impl LoadContext {
    /// Creates a load context.
    #[must_use]
    pub fn new(bundle_dir: PathBuf, artifacts: BTreeMap<String, PathBuf>) -> Self {
        Self { bundle_dir, artifacts }
    }

    /// Returns the resolved path of a logical artifact, if declared.
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> Option<&Path> {
        self.artifacts.get(name).map(PathBuf::as_path)
    }
}

/// The capability a loaded model bundle exposes.
///
/// Exactly one method is required; `load_context` is an optional lifecycle
/// hook for predictors that resolve resources from artifact files after
/// construction. All predictors must be `Send + Sync` so handles can be
/// shared across threads.
pub trait Predictor: Send + Sync {
    /// Called once after construction with the resolved artifact context.
    ///
    /// # Errors
    /// Returns a `PredictError` if deferred resources cannot be resolved.
    fn load_context(&mut self, _ctx: &LoadContext) -> Result<(), PredictError> {
        Ok(())
    }

    /// Runs inference over the input frame.
    ///
    /// The wrapped model's native entry point may differ from a literal
    /// "predict" (probability scores, forecasts); implementations map it to
    /// this uniform contract.
    ///
    /// # Errors
    /// Returns a `PredictError` if inference fails.
    fn predict(&self, input: &Frame) -> Result<Frame, PredictError>;
}
