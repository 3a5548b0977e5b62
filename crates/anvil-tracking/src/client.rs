//! Tracking REST client.

use crate::error::{TrackingError, TrackingResult};
use anvil_platform::AccessToken;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Fixed API suffix appended to the workspace tracking base URL.
pub const MLFLOW_API_SUFFIX: &str = "api/2.0/mlflow";

/// An experiment as returned by the tracking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_stage: Option<String>,
}

/// Core metadata of a tracked run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}

/// A tracked run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub info: RunInfo,
}

#[derive(Debug, Deserialize)]
struct ListExperimentsResponse {
    #[serde(default)]
    experiments: Vec<Experiment>,
}

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Serialize)]
struct SearchRunsRequest {
    experiment_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchRunsResponse {
    #[serde(default)]
    runs: Vec<Run>,
}

/// Client for the workspace tracking service.
#[derive(Debug, Clone)]
pub struct TrackingClient {
    /// Workspace tracking base URL (see
    /// `WorkspaceCoordinates::tracking_base`).
    base_url: String,
    /// Bearer token for every request.
    token: AccessToken,
    /// HTTP client for making requests.
    client: Client,
}

impl TrackingClient {
    /// Creates a tracking client against a workspace base URL.
    ///
    /// # Arguments
    /// * `base_url` - Tracking base URL, without a trailing slash
    /// * `token` - Bearer token acquired via `TokenClient`
    #[must_use]
    pub fn new(base_url: String, token: AccessToken) -> Self {
        Self { base_url, token, client: Client::new() }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, MLFLOW_API_SUFFIX, path)
    }

    async fn check(response: Response) -> TrackingResult<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Tracking API returned error status");
            return Err(TrackingError::Api { status: status.as_u16(), body });
        }
        Ok(response)
    }

    /// Lists every experiment in the workspace.
    ///
    /// # Errors
    /// Returns a `TrackingError` if the request fails or the response
    /// cannot be parsed.
    pub async fn list_experiments(&self) -> TrackingResult<Vec<Experiment>> {
        let url = self.endpoint("experiments/list");
        debug!(url = %url, "Listing experiments");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send experiments/list request");
                TrackingError::Request(format!("Network error: {}", e))
            })?;

        let parsed: ListExperimentsResponse =
            Self::check(response).await?.json().await.map_err(|e| {
                error!(error = %e, "Failed to parse experiments/list response");
                TrackingError::Serialization(format!("Failed to parse response: {}", e))
            })?;
        Ok(parsed.experiments)
    }

    /// Fetches one experiment by id.
    pub async fn get_experiment(&self, experiment_id: &str) -> TrackingResult<Experiment> {
        let url = self.endpoint("experiments/get");
        debug!(url = %url, experiment_id = %experiment_id, "Getting experiment");

        let response = self
            .client
            .get(&url)
            .query(&[("experiment_id", experiment_id)])
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send experiments/get request");
                TrackingError::Request(format!("Network error: {}", e))
            })?;

        let parsed: GetExperimentResponse =
            Self::check(response).await?.json().await.map_err(|e| {
                error!(error = %e, "Failed to parse experiments/get response");
                TrackingError::Serialization(format!("Failed to parse response: {}", e))
            })?;
        Ok(parsed.experiment)
    }

    /// Searches the runs of one experiment.
    pub async fn search_runs(
        &self,
        experiment_id: &str,
        max_results: Option<u32>,
    ) -> TrackingResult<Vec<Run>> {
        let url = self.endpoint("runs/search");
        debug!(url = %url, experiment_id = %experiment_id, "Searching runs");

        let body = SearchRunsRequest {
            experiment_ids: vec![experiment_id.to_string()],
            max_results,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send runs/search request");
                TrackingError::Request(format!("Network error: {}", e))
            })?;

        let parsed: SearchRunsResponse =
            Self::check(response).await?.json().await.map_err(|e| {
                error!(error = %e, "Failed to parse runs/search response");
                TrackingError::Serialization(format!("Failed to parse response: {}", e))
            })?;
        Ok(parsed.runs)
    }
}
