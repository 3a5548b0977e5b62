//! Workspace coordinates and the REST base URLs derived from them.

use serde::{Deserialize, Serialize};

/// Coordinates identifying one workspace inside the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceCoordinates {
    /// Subscription the workspace is billed to.
    pub subscription_id: String,
    /// Resource group containing the workspace.
    pub resource_group: String,
    /// Workspace name.
    pub workspace_name: String,
    /// Region the workspace is deployed in (e.g. `eastus2`).
    pub region: String,
}

impl WorkspaceCoordinates {
    /// Creates workspace coordinates.
    #[must_use]
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        workspace_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            workspace_name: workspace_name.into(),
            region: region.into(),
        }
    }

    /// Resource path of the workspace, shared by tracking and management
    /// URLs.
    #[must_use]
    pub fn resource_path(&self) -> String {
        format!(
            "subscriptions/{}/resourceGroups/{}/workspaces/{}",
            self.subscription_id, self.resource_group, self.workspace_name
        )
    }

    /// Base URL of the workspace's tracking service on the given host.
    ///
    /// Tracking endpoints hang off this base under the fixed
    /// `api/2.0/mlflow` suffix.
    #[must_use]
    pub fn tracking_base(&self, host: &str) -> String {
        format!("https://{}.{}/history/v1.0/{}", self.region, host, self.resource_path())
    }

    /// Base URL of the management service on the given host.
    #[must_use]
    pub fn management_base(&self, host: &str) -> String {
        format!("https://management.{}/{}", host, self.resource_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> WorkspaceCoordinates {
        WorkspaceCoordinates::new("sub-1", "rg-1", "ws-1", "eastus2")
    }

    #[test]
    fn test_tracking_base() {
        assert_eq!(
            coords().tracking_base("api.anvil-ml.dev"),
            "https://eastus2.api.anvil-ml.dev/history/v1.0/subscriptions/sub-1/resourceGroups/rg-1/workspaces/ws-1"
        );
    }

    #[test]
    fn test_management_base() {
        assert_eq!(
            coords().management_base("anvil-ml.dev"),
            "https://management.anvil-ml.dev/subscriptions/sub-1/resourceGroups/rg-1/workspaces/ws-1"
        );
    }
}
