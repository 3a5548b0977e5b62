//! The bundle manifest: the single source of truth for how a callable
//! predictor is reconstructed from a bundle directory. No other file's
//! meaning is assumed without reading it first.

use crate::artifacts::ArtifactEntry;
use crate::error::{BundleError, BundleResult};
use anvil_abstraction::Signature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the manifest inside a bundle directory.
pub const MANIFEST_FILE: &str = "bundle_manifest.json";

/// Manifest format version this crate writes and accepts.
pub const MANIFEST_FORMAT: u32 = 1;

/// How the predictor is reconstructed from the bundle contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryPoint {
    /// Adapter state serialized into the bundle at logging time. The named
    /// flavor deserializes `state` back into a predictor.
    Embedded {
        /// Registered flavor id (e.g. `linear`).
        flavor: String,
        /// Bundle-relative path of the serialized state.
        state: PathBuf,
    },
    /// A registered loader invoked lazily at load time with the resolved
    /// path of `artifact` (or the bundle directory when `artifact` is
    /// `None`). Exists so a bundle can move between environments without
    /// the original object graph surviving serialization.
    Deferred {
        /// Registered loader id.
        loader: String,
        /// Logical name of the artifact handed to the loader.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
    },
}

impl EntryPoint {
    /// The symbolic id the registry resolves for this entry point.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Embedded { flavor, .. } => flavor,
            Self::Deferred { loader, .. } => loader,
        }
    }
}

/// Manifest of a logged model bundle.
///
/// Bundles are immutable: a manifest is written once by `log_model` and
/// never rewritten; new logs allocate a new version directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Manifest format version.
    pub format: u32,
    /// Registered model name.
    pub name: String,
    /// Version under the name, starting at 1.
    pub version: u32,
    /// Identifier of the logging run that produced this bundle.
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    /// How to reconstruct the predictor.
    pub entry_point: EntryPoint,
    /// Declared input/output shape, enforced at inference time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Auxiliary files staged under `artifacts/`, by logical name.
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
    /// Companion source files staged under `code/`, bundle-relative.
    #[serde(default)]
    pub source_files: Vec<PathBuf>,
}

impl BundleManifest {
    /// Reads the manifest from a bundle directory.
    ///
    /// # Errors
    /// Returns `BundleError::ManifestMissing` when the directory lacks a
    /// manifest, and `BundleError::InvalidManifest` when the format version
    /// is not supported.
    pub fn read(bundle_dir: &Path) -> BundleResult<Self> {
        let path = bundle_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(BundleError::ManifestMissing(bundle_dir.to_path_buf()));
        }
        let bytes = std::fs::read(&path)?;
        let manifest: Self = serde_json::from_slice(&bytes)?;
        if manifest.format != MANIFEST_FORMAT {
            return Err(BundleError::InvalidManifest(format!(
                "unsupported manifest format {} (expected {})",
                manifest.format, MANIFEST_FORMAT
            )));
        }
        Ok(manifest)
    }

    /// Writes the manifest into a bundle directory.
    pub fn write(&self, bundle_dir: &Path) -> BundleResult<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(bundle_dir.join(MANIFEST_FILE), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> BundleManifest {
        BundleManifest {
            format: MANIFEST_FORMAT,
            name: "churn".to_string(),
            version: 1,
            run_id: "run-1".to_string(),
            created_at: Utc::now(),
            entry_point: EntryPoint::Deferred {
                loader: "xgb_loader".to_string(),
                artifact: Some("xgb.model".to_string()),
            },
            signature: None,
            artifacts: Vec::new(),
            source_files: Vec::new(),
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let temp = TempDir::new().unwrap();
        let m = manifest();
        m.write(temp.path()).unwrap();

        let back = BundleManifest::read(temp.path()).unwrap();
        assert_eq!(back.name, "churn");
        assert_eq!(back.entry_point, m.entry_point);
        assert_eq!(back.entry_point.id(), "xgb_loader");
    }

    #[test]
    fn test_read_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let err = BundleManifest::read(temp.path()).unwrap_err();
        assert!(matches!(err, BundleError::ManifestMissing(_)));
    }

    #[test]
    fn test_read_unsupported_format() {
        let temp = TempDir::new().unwrap();
        let mut m = manifest();
        m.format = 99;
        let bytes = serde_json::to_vec(&m).unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), bytes).unwrap();

        let err = BundleManifest::read(temp.path()).unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(_)));
    }

    #[test]
    fn test_entry_point_serialization_tag() {
        let ep = EntryPoint::Embedded {
            flavor: "linear".to_string(),
            state: PathBuf::from("predictor.json"),
        };
        let text = serde_json::to_string(&ep).unwrap();
        assert!(text.contains(r#""kind":"embedded""#));
        assert!(text.contains(r#""flavor":"linear""#));
    }
}
