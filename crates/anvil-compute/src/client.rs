//! Compute management REST client.

use crate::error::{ComputeError, ComputeResult};
use anvil_platform::AccessToken;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Management API version sent with every request.
pub const API_VERSION: &str = "2023-04-01";

/// Identity the attached compute runs jobs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum ComputeIdentity {
    /// Platform-managed identity created with the attachment.
    SystemAssigned,
    /// Caller-supplied identity.
    UserAssigned {
        /// Client id of the user-assigned identity.
        client_id: String,
    },
}

/// Descriptor of a managed Spark pool to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparkComputeSpec {
    /// Name the compute is registered under in the workspace.
    pub name: String,
    /// Full resource id of the external Spark pool.
    pub resource_id: String,
    /// Optional identity; the pool's own identity is used when absent.
    pub identity: Option<ComputeIdentity>,
}

impl SparkComputeSpec {
    /// Creates a spec without an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self { name: name.into(), resource_id: resource_id.into(), identity: None }
    }

    /// Sets the identity for this spec.
    #[must_use]
    pub fn with_identity(mut self, identity: ComputeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

#[derive(Debug, Serialize)]
struct ComputeProperties {
    #[serde(rename = "computeType")]
    compute_type: &'static str,
    #[serde(rename = "resourceId")]
    resource_id: String,
}

#[derive(Debug, Serialize)]
struct AttachRequest {
    properties: ComputeProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<ComputeIdentity>,
}

/// A compute resource as returned by the management API.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputeResource {
    pub name: String,
    #[serde(default)]
    pub properties: serde_json::Value,
}

/// Client for the workspace compute management API.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    /// Workspace management base URL (see
    /// `WorkspaceCoordinates::management_base`).
    base_url: String,
    /// Bearer token for every request.
    token: AccessToken,
    /// HTTP client for making requests.
    client: Client,
}

impl ComputeClient {
    /// Creates a compute client against a workspace management base URL.
    #[must_use]
    pub fn new(base_url: String, token: AccessToken) -> Self {
        Self { base_url, token, client: Client::new() }
    }

    fn compute_url(&self, name: &str) -> String {
        format!("{}/computes/{}", self.base_url, name)
    }

    async fn check(response: Response) -> ComputeResult<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Management API returned error status");
            return Err(ComputeError::Api { status: status.as_u16(), body });
        }
        Ok(response)
    }

    /// Attaches a managed Spark pool via create-or-update.
    ///
    /// # Errors
    /// Returns a `ComputeError` if the request fails or is rejected.
    pub async fn attach(&self, spec: &SparkComputeSpec) -> ComputeResult<ComputeResource> {
        let url = self.compute_url(&spec.name);
        debug!(name = %spec.name, resource_id = %spec.resource_id, "Attaching Spark compute");

        let body = AttachRequest {
            properties: ComputeProperties {
                compute_type: "Spark",
                resource_id: spec.resource_id.clone(),
            },
            identity: spec.identity.clone(),
        };

        let response = self
            .client
            .put(&url)
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(&self.token.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send attach request");
                ComputeError::Request(format!("Network error: {}", e))
            })?;

        Self::check(response).await?.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse attach response");
            ComputeError::Serialization(format!("Failed to parse response: {}", e))
        })
    }

    /// Detaches a compute by name. The underlying pool is left in place;
    /// only the workspace registration is removed.
    pub async fn detach(&self, name: &str) -> ComputeResult<()> {
        let url = self.compute_url(name);
        debug!(name = %name, "Detaching compute");

        let response = self
            .client
            .delete(&url)
            .query(&[
                ("api-version", API_VERSION),
                ("underlyingResourceAction", "Detach"),
            ])
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send detach request");
                ComputeError::Request(format!("Network error: {}", e))
            })?;

        Self::check(response).await?;
        Ok(())
    }

    /// Fetches a compute registration by name.
    pub async fn get(&self, name: &str) -> ComputeResult<ComputeResource> {
        let url = self.compute_url(name);
        debug!(name = %name, "Getting compute");

        let response = self
            .client
            .get(&url)
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send get request");
                ComputeError::Request(format!("Network error: {}", e))
            })?;

        Self::check(response).await?.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse get response");
            ComputeError::Serialization(format!("Failed to parse response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: String) -> ComputeClient {
        ComputeClient::new(base_url, AccessToken::bearer("tok-1"))
    }

    #[tokio::test]
    async fn test_attach_sends_create_or_update() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/computes/spark-pool")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                API_VERSION.into(),
            ))
            .match_header("authorization", "Bearer tok-1")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"properties": {"computeType": "Spark", "resourceId": "/pools/p1"}}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{"name": "spark-pool", "properties": {"provisioningState": "Succeeded"}}"#,
            )
            .create();

        let spec = SparkComputeSpec::new("spark-pool", "/pools/p1");
        let resource = client(server.url()).attach(&spec).await.unwrap();
        assert_eq!(resource.name, "spark-pool");
        mock.assert();
    }

    #[tokio::test]
    async fn test_attach_with_user_assigned_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/computes/spark-pool")
            .match_query(mockito::Matcher::Any)
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"identity": {"type": "UserAssigned", "client_id": "uai-1"}}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"name": "spark-pool"}"#)
            .create();

        let spec = SparkComputeSpec::new("spark-pool", "/pools/p1")
            .with_identity(ComputeIdentity::UserAssigned { client_id: "uai-1".to_string() });
        client(server.url()).attach(&spec).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_detach_requests_detach_action() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/computes/spark-pool")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("api-version".into(), API_VERSION.into()),
                mockito::Matcher::UrlEncoded(
                    "underlyingResourceAction".into(),
                    "Detach".into(),
                ),
            ]))
            .with_status(200)
            .create();

        client(server.url()).detach("spark-pool").await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_get_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/computes/missing")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body("not found")
            .create();

        let err = client(server.url()).get("missing").await.unwrap_err();
        match err {
            ComputeError::Api { status, .. } => assert_eq!(status, 404),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
