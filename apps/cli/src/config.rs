//! CLI configuration loading and merging.

use anvil_platform::WorkspaceCoordinates;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TRACKING_HOST: &str = "api.anvil-ml.dev";
const DEFAULT_MANAGEMENT_HOST: &str = "anvil-ml.dev";

/// CLI configuration.
///
/// Configuration precedence:
/// 1. Environment variables (`ANVIL_SUBSCRIPTION_ID`, `ANVIL_RESOURCE_GROUP`,
///    `ANVIL_WORKSPACE_NAME`, `ANVIL_REGION`)
/// 2. Workspace config file (`<workspace>/.anvil/config.toml`)
/// 3. Defaults (hosts only; coordinates have no default)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub workspace_name: Option<String>,
    pub region: Option<String>,
    pub tracking_host: Option<String>,
    pub management_host: Option<String>,
}

impl Config {
    /// Loads configuration for a workspace root.
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(".anvil").join("config.toml");
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        let env_override = |slot: &mut Option<String>, key: &str| {
            if let Ok(value) = std::env::var(key) {
                *slot = Some(value);
            }
        };
        env_override(&mut config.subscription_id, "ANVIL_SUBSCRIPTION_ID");
        env_override(&mut config.resource_group, "ANVIL_RESOURCE_GROUP");
        env_override(&mut config.workspace_name, "ANVIL_WORKSPACE_NAME");
        env_override(&mut config.region, "ANVIL_REGION");

        Ok(config)
    }

    /// Workspace coordinates assembled from the configuration.
    ///
    /// # Errors
    /// Fails naming the first coordinate that is not configured.
    pub fn coordinates(&self) -> Result<WorkspaceCoordinates> {
        let require = |value: &Option<String>, key: &str| {
            value
                .clone()
                .with_context(|| format!("'{key}' is not configured (set it in .anvil/config.toml or the environment)"))
        };
        Ok(WorkspaceCoordinates::new(
            require(&self.subscription_id, "subscription_id")?,
            require(&self.resource_group, "resource_group")?,
            require(&self.workspace_name, "workspace_name")?,
            require(&self.region, "region")?,
        ))
    }

    pub fn tracking_host(&self) -> &str {
        self.tracking_host.as_deref().unwrap_or(DEFAULT_TRACKING_HOST)
    }

    pub fn management_host(&self) -> &str {
        self.management_host.as_deref().unwrap_or(DEFAULT_MANAGEMENT_HOST)
    }

    /// OAuth resource (audience) for tracking calls.
    pub fn tracking_resource(&self) -> String {
        format!("https://{}", self.tracking_host())
    }

    /// OAuth resource (audience) for management calls.
    pub fn management_resource(&self) -> String {
        format!("https://management.{}", self.management_host())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.tracking_host(), DEFAULT_TRACKING_HOST);
        assert!(config.coordinates().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".anvil")).unwrap();
        std::fs::write(
            temp.path().join(".anvil/config.toml"),
            r#"
subscription_id = "sub-1"
resource_group = "rg-1"
workspace_name = "ws-1"
region = "eastus2"
"#,
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        let coords = config.coordinates().unwrap();
        assert_eq!(coords.subscription_id, "sub-1");
        assert_eq!(coords.region, "eastus2");
    }
}
