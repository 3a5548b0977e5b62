use crate::artifacts::{ARTIFACTS_DIR, SOURCES_DIR};
use crate::error::BundleResult;
use std::path::{Path, PathBuf};

/// Filesystem layout of the local model registry inside a workspace.
///
/// Default layout is `<workspace_root>/.anvil/registry/<name>/v<version>/`,
/// where each version directory is one complete, immutable bundle.
#[derive(Debug, Clone)]
pub struct RegistryLayout {
    root: PathBuf,
}

impl RegistryLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create a layout rooted in an Anvil workspace root.
    #[must_use]
    pub fn for_workspace_root(workspace_root: &Path) -> Self {
        Self::new(workspace_root.join(".anvil").join("registry"))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn model_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    #[must_use]
    pub fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.model_dir(name).join(format!("v{version}"))
    }

    /// Lists the logged versions of a model, ascending. A model with no
    /// directory has no versions.
    pub fn versions(&self, name: &str) -> BundleResult<Vec<u32>> {
        let dir = match std::fs::read_dir(self.model_dir(name)) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in dir {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(v) = file_name
                .to_str()
                .and_then(|s| s.strip_prefix('v'))
                .and_then(|s| s.parse::<u32>().ok())
            {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Next version to allocate for a model name.
    pub fn next_version(&self, name: &str) -> BundleResult<u32> {
        Ok(self.versions(name)?.last().copied().unwrap_or(0) + 1)
    }

    /// Creates the version directory and its `artifacts/` and `code/`
    /// subdirectories.
    pub fn ensure_bundle_dirs(&self, name: &str, version: u32) -> BundleResult<PathBuf> {
        let dir = self.version_dir(name, version);
        std::fs::create_dir_all(dir.join(ARTIFACTS_DIR))?;
        std::fs::create_dir_all(dir.join(SOURCES_DIR))?;
        Ok(dir)
    }
}
