//! Versioned local model store.
//!
//! `log_model` creates one immutable bundle directory per call; `load`
//! addresses bundles by `(name, version)` and reconstructs a predictor
//! through the loader registry.

use crate::artifacts::{stage_artifact, stage_source, verify_artifacts};
use crate::error::{BundleError, BundleResult};
use crate::layout::RegistryLayout;
use crate::loader::{LoaderRegistry, PredictorHandle};
use crate::manifest::{BundleManifest, EntryPoint, MANIFEST_FORMAT};
use anvil_abstraction::Signature;
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of serialized adapter state inside a bundle.
pub const EMBEDDED_STATE_FILE: &str = "predictor.json";

/// Entry-point choice for a log request.
#[derive(Debug, Clone)]
pub enum LogEntryPoint {
    /// Serialize the given adapter state into the bundle (strategy 1).
    Embedded { flavor: String, state: Value },
    /// Record a symbolic loader id resolved at load time (strategy 2).
    Deferred { loader: String, artifact: Option<String> },
}

/// Everything needed to log one model bundle.
#[derive(Debug, Clone)]
pub struct LogModelRequest {
    pub name: String,
    pub entry_point: LogEntryPoint,
    pub signature: Option<Signature>,
    /// Logical name to source path of auxiliary files to stage.
    pub artifacts: Vec<(String, PathBuf)>,
    /// Companion source files to stage under `code/`.
    pub source_files: Vec<PathBuf>,
}

impl LogModelRequest {
    /// Starts a request for an embedded adapter.
    #[must_use]
    pub fn embedded(name: impl Into<String>, flavor: impl Into<String>, state: Value) -> Self {
        Self {
            name: name.into(),
            entry_point: LogEntryPoint::Embedded { flavor: flavor.into(), state },
            signature: None,
            artifacts: Vec::new(),
            source_files: Vec::new(),
        }
    }

    /// Starts a request for a deferred loader.
    #[must_use]
    pub fn deferred(
        name: impl Into<String>,
        loader: impl Into<String>,
        artifact: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entry_point: LogEntryPoint::Deferred { loader: loader.into(), artifact },
            signature: None,
            artifacts: Vec::new(),
            source_files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    #[must_use]
    pub fn with_artifact(mut self, name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        self.artifacts.push((name.into(), source.into()));
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source_files.push(source.into());
        self
    }
}

/// A discovered bundle in the registry.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub name: String,
    pub version: u32,
    pub bundle_dir: PathBuf,
    pub manifest: BundleManifest,
}

/// The local model registry: layout plus loader registry.
pub struct ModelStore {
    layout: RegistryLayout,
    registry: LoaderRegistry,
}

impl ModelStore {
    /// Creates a store rooted in a workspace, with the built-in registry.
    #[must_use]
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            layout: RegistryLayout::for_workspace_root(workspace_root),
            registry: LoaderRegistry::builtin(),
        }
    }

    /// Creates a store with an explicit layout and registry.
    #[must_use]
    pub fn with_registry(layout: RegistryLayout, registry: LoaderRegistry) -> Self {
        Self { layout, registry }
    }

    /// Mutable access to the loader registry, for registering custom
    /// flavors and loaders.
    pub fn registry_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    /// Logs a model bundle, allocating the next version under its name.
    ///
    /// Artifacts and sources are staged first; the manifest is written
    /// last, so a directory without a manifest is never a loadable bundle.
    ///
    /// # Errors
    /// Returns `BundleError::Artifact` if a source file is missing or the
    /// allocated version directory already exists.
    pub fn log_model(&self, request: LogModelRequest) -> BundleResult<BundleManifest> {
        if request.name.is_empty() || request.name.contains(['/', '\\']) {
            return Err(BundleError::InvalidManifest(format!(
                "invalid model name: '{}'",
                request.name
            )));
        }

        let version = self.layout.next_version(&request.name)?;
        let bundle_dir = self.layout.version_dir(&request.name, version);
        if bundle_dir.exists() {
            return Err(BundleError::Artifact(format!(
                "refusing to overwrite existing bundle: {}",
                bundle_dir.display()
            )));
        }
        self.layout.ensure_bundle_dirs(&request.name, version)?;

        let mut artifacts = Vec::with_capacity(request.artifacts.len());
        for (name, source) in &request.artifacts {
            artifacts.push(stage_artifact(&bundle_dir, name, source)?);
        }

        let mut source_files = Vec::with_capacity(request.source_files.len());
        for source in &request.source_files {
            source_files.push(stage_source(&bundle_dir, source)?);
        }

        let entry_point = match request.entry_point {
            LogEntryPoint::Embedded { flavor, state } => {
                let state_path = PathBuf::from(EMBEDDED_STATE_FILE);
                std::fs::write(
                    bundle_dir.join(&state_path),
                    serde_json::to_vec_pretty(&state)?,
                )?;
                EntryPoint::Embedded { flavor, state: state_path }
            }
            LogEntryPoint::Deferred { loader, artifact } => {
                EntryPoint::Deferred { loader, artifact }
            }
        };

        let manifest = BundleManifest {
            format: MANIFEST_FORMAT,
            name: request.name,
            version,
            run_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            entry_point,
            signature: request.signature,
            artifacts,
            source_files,
        };
        manifest.write(&bundle_dir)?;
        Ok(manifest)
    }

    /// Loads a model by name, at the given version or the latest.
    ///
    /// # Errors
    /// Returns `ModelNotFound` for an unknown name and `VersionNotFound`
    /// for a version that was never logged.
    pub fn load(&self, name: &str, version: Option<u32>) -> BundleResult<PredictorHandle> {
        let bundle_dir = self.resolve_version_dir(name, version)?;
        self.load_path(&bundle_dir)
    }

    /// Loads a bundle directly from a bundle directory.
    pub fn load_path(&self, bundle_dir: &Path) -> BundleResult<PredictorHandle> {
        let manifest = BundleManifest::read(bundle_dir)?;
        self.registry.resolve(&manifest, bundle_dir)
    }

    /// Reads the manifest of a logged model without constructing a
    /// predictor.
    pub fn manifest(&self, name: &str, version: Option<u32>) -> BundleResult<BundleManifest> {
        let bundle_dir = self.resolve_version_dir(name, version)?;
        BundleManifest::read(&bundle_dir)
    }

    /// Re-hashes a bundle's staged artifacts against the manifest.
    pub fn verify(&self, name: &str, version: Option<u32>) -> BundleResult<()> {
        let bundle_dir = self.resolve_version_dir(name, version)?;
        let manifest = BundleManifest::read(&bundle_dir)?;
        verify_artifacts(&bundle_dir, &manifest.artifacts)
    }

    /// Discovers every logged bundle by scanning the registry for
    /// manifests. Version directories without a manifest are skipped.
    pub fn list(&self) -> BundleResult<Vec<ModelEntry>> {
        let mut out = Vec::new();

        let dir = match std::fs::read_dir(self.layout.root()) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };

        for entry in dir {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            for version in self.layout.versions(&name)? {
                let bundle_dir = self.layout.version_dir(&name, version);
                let manifest = match BundleManifest::read(&bundle_dir) {
                    Ok(m) => m,
                    Err(BundleError::ManifestMissing(_)) => continue,
                    Err(e) => return Err(e),
                };
                out.push(ModelEntry { name: name.clone(), version, bundle_dir, manifest });
            }
        }

        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.version.cmp(&b.version)));
        Ok(out)
    }

    fn resolve_version_dir(&self, name: &str, version: Option<u32>) -> BundleResult<PathBuf> {
        let versions = self.layout.versions(name)?;
        let Some(&latest) = versions.last() else {
            return Err(BundleError::ModelNotFound(name.to_string()));
        };
        let v = version.unwrap_or(latest);
        if !versions.contains(&v) {
            return Err(BundleError::VersionNotFound { name: name.to_string(), version: v });
        }
        Ok(self.layout.version_dir(name, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavors::{LinearModel, LINEAR_FLAVOR};
    use tempfile::TempDir;

    fn linear_request(name: &str, weight: f64) -> LogModelRequest {
        let model =
            LinearModel::new(vec!["x".to_string()], vec![weight], 0.0).unwrap();
        LogModelRequest::embedded(name, LINEAR_FLAVOR, model.state().unwrap())
    }

    #[test]
    fn test_log_allocates_sequential_versions() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path());

        let m1 = store.log_model(linear_request("churn", 1.0)).unwrap();
        let m2 = store.log_model(linear_request("churn", 2.0)).unwrap();

        assert_eq!(m1.version, 1);
        assert_eq!(m2.version, 2);
        assert_ne!(m1.run_id, m2.run_id);
    }

    #[test]
    fn test_invalid_model_name() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path());
        let err = store.log_model(linear_request("a/b", 1.0)).unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(_)));
    }

    #[test]
    fn test_load_unknown_name() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path());
        let err = store.load("ghost", None).unwrap_err();
        assert!(matches!(err, BundleError::ModelNotFound(_)));
    }

    #[test]
    fn test_load_unknown_version() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path());
        store.log_model(linear_request("churn", 1.0)).unwrap();

        let err = store.load("churn", Some(7)).unwrap_err();
        assert!(matches!(err, BundleError::VersionNotFound { version: 7, .. }));
    }

    #[test]
    fn test_list_skips_manifestless_directories() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path());
        store.log_model(linear_request("churn", 1.0)).unwrap();
        // A crashed log: directory allocated, manifest never written.
        store.layout().ensure_bundle_dirs("churn", 2).unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, 1);
    }

    #[test]
    fn test_verify_logged_bundle() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("aux.bin");
        std::fs::write(&src, b"aux").unwrap();

        let store = ModelStore::new(temp.path());
        store
            .log_model(linear_request("churn", 1.0).with_artifact("aux", &src))
            .unwrap();

        store.verify("churn", None).unwrap();
    }
}
