//! Artifact staging, resolution, and verification.

use crate::error::{BundleError, BundleResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Subdirectory holding staged auxiliary files.
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Subdirectory holding companion source files.
pub const SOURCES_DIR: &str = "code";

/// One auxiliary file packaged with a bundle, referenced by logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Logical name the entry point and loaders refer to.
    pub name: String,
    /// Bundle-relative path of the staged copy.
    pub path: PathBuf,
    pub sha256: String,
}

pub fn sha256_file(path: &Path) -> BundleResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn file_name(path: &Path) -> BundleResult<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| {
        BundleError::Artifact(format!("path has no file name: {}", path.display()))
    })
}

/// Copies a source file into the bundle's `artifacts/` directory and
/// records its digest.
///
/// # Errors
/// Returns `BundleError::Artifact` if the source does not exist or another
/// artifact already staged the same file name.
pub fn stage_artifact(
    bundle_dir: &Path,
    name: &str,
    source: &Path,
) -> BundleResult<ArtifactEntry> {
    if !source.exists() {
        return Err(BundleError::Artifact(format!(
            "artifact source does not exist: {}",
            source.display()
        )));
    }

    let relative = PathBuf::from(ARTIFACTS_DIR).join(file_name(source)?);
    let dest = bundle_dir.join(&relative);
    if dest.exists() {
        return Err(BundleError::Artifact(format!(
            "artifact file name collision: {}",
            relative.display()
        )));
    }
    std::fs::copy(source, &dest)?;

    let hash = sha256_file(&dest)?;
    Ok(ArtifactEntry { name: name.to_string(), path: relative, sha256: hash })
}

/// Copies a companion source file into the bundle's `code/` directory,
/// returning the bundle-relative path.
///
/// # Errors
/// Returns `BundleError::Artifact` if the source does not exist or another
/// source already staged the same file name.
pub fn stage_source(bundle_dir: &Path, source: &Path) -> BundleResult<PathBuf> {
    if !source.exists() {
        return Err(BundleError::Artifact(format!(
            "source file does not exist: {}",
            source.display()
        )));
    }
    let relative = PathBuf::from(SOURCES_DIR).join(file_name(source)?);
    let dest = bundle_dir.join(&relative);
    if dest.exists() {
        return Err(BundleError::Artifact(format!(
            "source file name collision: {}",
            relative.display()
        )));
    }
    std::fs::copy(source, &dest)?;
    Ok(relative)
}

/// Resolves every declared artifact to an absolute path, checking
/// existence.
///
/// # Errors
/// Returns `BundleError::UnresolvedArtifact` for the first entry whose
/// staged file is absent from disk.
pub fn resolve_artifacts(
    bundle_dir: &Path,
    entries: &[ArtifactEntry],
) -> BundleResult<BTreeMap<String, PathBuf>> {
    let mut resolved = BTreeMap::new();
    for entry in entries {
        let path = bundle_dir.join(&entry.path);
        if !path.exists() {
            return Err(BundleError::UnresolvedArtifact {
                name: entry.name.clone(),
                path,
            });
        }
        resolved.insert(entry.name.clone(), path);
    }
    Ok(resolved)
}

/// Re-hashes every staged artifact against its recorded digest.
///
/// # Errors
/// Returns `BundleError::UnresolvedArtifact` for a missing file and
/// `BundleError::Artifact` for a digest mismatch.
pub fn verify_artifacts(bundle_dir: &Path, entries: &[ArtifactEntry]) -> BundleResult<()> {
    for (name, path) in resolve_artifacts(bundle_dir, entries)? {
        let entry = entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| BundleError::Artifact(format!("unknown artifact '{name}'")))?;
        let hash = sha256_file(&path)?;
        if hash != entry.sha256 {
            return Err(BundleError::Artifact(format!(
                "artifact '{name}' digest mismatch: recorded {}, found {hash}",
                entry.sha256
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundle_with_artifact(temp: &TempDir) -> (PathBuf, ArtifactEntry) {
        let bundle = temp.path().join("bundle");
        std::fs::create_dir_all(bundle.join(ARTIFACTS_DIR)).unwrap();
        let src = temp.path().join("weights.bin");
        std::fs::write(&src, b"weights").unwrap();
        let entry = stage_artifact(&bundle, "weights", &src).unwrap();
        (bundle, entry)
    }

    #[test]
    fn test_stage_and_resolve() {
        let temp = TempDir::new().unwrap();
        let (bundle, entry) = bundle_with_artifact(&temp);

        assert_eq!(entry.path, PathBuf::from("artifacts/weights.bin"));
        assert_eq!(entry.sha256.len(), 64);

        let resolved = resolve_artifacts(&bundle, &[entry]).unwrap();
        assert!(resolved["weights"].exists());
    }

    #[test]
    fn test_resolve_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let (bundle, entry) = bundle_with_artifact(&temp);
        std::fs::remove_file(bundle.join(&entry.path)).unwrap();

        let err = resolve_artifacts(&bundle, &[entry]).unwrap_err();
        match err {
            BundleError::UnresolvedArtifact { name, .. } => assert_eq!(name, "weights"),
            other => panic!("expected UnresolvedArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_stage_missing_source() {
        let temp = TempDir::new().unwrap();
        let err =
            stage_artifact(temp.path(), "w", &temp.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, BundleError::Artifact(_)));
    }

    #[test]
    fn test_stage_name_collision() {
        let temp = TempDir::new().unwrap();
        let (bundle, _entry) = bundle_with_artifact(&temp);
        let src = temp.path().join("weights.bin");
        let err = stage_artifact(&bundle, "other", &src).unwrap_err();
        assert!(matches!(err, BundleError::Artifact(_)));
    }

    #[test]
    fn test_verify_detects_tamper() {
        let temp = TempDir::new().unwrap();
        let (bundle, entry) = bundle_with_artifact(&temp);

        verify_artifacts(&bundle, std::slice::from_ref(&entry)).unwrap();

        std::fs::write(bundle.join(&entry.path), b"tampered").unwrap();
        let err = verify_artifacts(&bundle, &[entry]).unwrap_err();
        assert!(matches!(err, BundleError::Artifact(_)));
    }

    #[test]
    fn test_stage_source_file() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("bundle");
        std::fs::create_dir_all(bundle.join(SOURCES_DIR)).unwrap();
        let src = temp.path().join("loader.rs");
        std::fs::write(&src, "// loader").unwrap();

        let relative = stage_source(&bundle, &src).unwrap();
        assert_eq!(relative, PathBuf::from("code/loader.rs"));
        assert!(bundle.join(relative).exists());
    }

    #[test]
    fn test_stage_source_name_collision() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("bundle");
        std::fs::create_dir_all(bundle.join(SOURCES_DIR)).unwrap();
        let src = temp.path().join("loader.rs");
        std::fs::write(&src, "// loader").unwrap();
        stage_source(&bundle, &src).unwrap();

        let other = temp.path().join("nested");
        std::fs::create_dir_all(&other).unwrap();
        let clash = other.join("loader.rs");
        std::fs::write(&clash, "// different loader").unwrap();

        let err = stage_source(&bundle, &clash).unwrap_err();
        assert!(matches!(err, BundleError::Artifact(_)));
        // The first staged copy is left intact.
        assert_eq!(
            std::fs::read_to_string(bundle.join("code/loader.rs")).unwrap(),
            "// loader"
        );
    }
}
