use anvil_abstraction::PredictError;
use std::path::PathBuf;
use thiserror::Error;

pub type BundleResult<T> = std::result::Result<T, BundleError>;

/// Errors surfaced by the bundle loader contract.
///
/// None of these are retried; all are returned directly to the caller.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle directory has no manifest.
    #[error("bundle manifest missing: {0}")]
    ManifestMissing(PathBuf),

    /// A declared auxiliary file is absent from disk.
    #[error("artifact '{name}' not found at {path}")]
    UnresolvedArtifact { name: String, path: PathBuf },

    /// The declared flavor or loader id is not registered.
    #[error("loader resolution failed: {0}")]
    LoaderResolution(String),

    /// Caller input (or predictor output) does not conform to the declared
    /// signature. Recoverable by the caller; never auto-coerced.
    #[error("signature mismatch: {0}")]
    SignatureMismatch(String),

    /// An artifact could not be staged or failed verification.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// The manifest is present but unusable.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// No bundle has been logged under this name.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The requested version of a model does not exist.
    #[error("model '{name}' has no version {version}")]
    VersionNotFound { name: String, version: u32 },

    /// The predictor itself failed.
    #[error("predict error: {0}")]
    Predict(PredictError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<PredictError> for BundleError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::SignatureMismatch(msg) => Self::SignatureMismatch(msg),
            other => Self::Predict(other),
        }
    }
}
