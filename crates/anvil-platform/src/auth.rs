//! Service-principal authentication.
//!
//! Exchanges service-principal credentials for a bearer token via the
//! OAuth2 client-credentials grant.

use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use tracing::{debug, error};

/// Default authority host for token exchange.
pub const DEFAULT_AUTHORITY: &str = "https://login.anvil-ml.dev";

/// A service principal: the non-interactive identity used for every
/// platform call.
#[derive(Debug, Clone)]
pub struct ServicePrincipal {
    /// Directory (tenant) the principal lives in.
    pub tenant_id: String,
    /// Application (client) id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
}

impl ServicePrincipal {
    /// Creates a service principal from explicit credentials.
    #[must_use]
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Self {
        Self { tenant_id, client_id, client_secret }
    }

    /// Loads credentials from `ANVIL_TENANT_ID`, `ANVIL_CLIENT_ID`, and
    /// `ANVIL_CLIENT_SECRET`.
    ///
    /// # Errors
    /// Returns `AuthError::MissingCredential` naming the first variable
    /// that is not set.
    pub fn from_env() -> AuthResult<Self> {
        let read = |key: &str| {
            env::var(key).map_err(|_| AuthError::MissingCredential(key.to_string()))
        };
        Ok(Self {
            tenant_id: read("ANVIL_TENANT_ID")?,
            client_id: read("ANVIL_CLIENT_ID")?,
            client_secret: read("ANVIL_CLIENT_SECRET")?,
        })
    }
}

/// A bearer token returned by the token endpoint.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The raw token value.
    pub token: String,
    /// Token type, normally `Bearer`.
    pub token_type: String,
    /// When the token was acquired.
    pub acquired_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a token directly; used by tests and by callers that manage
    /// their own exchange.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: "Bearer".to_string(),
            acquired_at: Utc::now(),
        }
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
}

/// Client for the OAuth2 client-credentials token exchange.
#[derive(Debug, Clone)]
pub struct TokenClient {
    /// Authority base URL (e.g. `https://login.anvil-ml.dev`).
    authority: String,
    /// HTTP client for making requests.
    client: Client,
}

impl Default for TokenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenClient {
    /// Creates a token client against the default authority.
    #[must_use]
    pub fn new() -> Self {
        Self::with_authority(DEFAULT_AUTHORITY.to_string())
    }

    /// Creates a token client against a custom authority.
    ///
    /// # Arguments
    /// * `authority` - Authority base URL, without a trailing slash
    #[must_use]
    pub fn with_authority(authority: String) -> Self {
        Self { authority, client: Client::new() }
    }

    /// Exchanges service-principal credentials for a bearer token.
    ///
    /// Issues a `grant_type=client_credentials` POST against
    /// `{authority}/{tenant_id}/oauth2/token` scoped to `resource`.
    ///
    /// # Errors
    /// Returns an `AuthError` if the request fails, the endpoint returns a
    /// non-success status, or the response body cannot be parsed.
    pub async fn acquire(
        &self,
        principal: &ServicePrincipal,
        resource: &str,
    ) -> AuthResult<AccessToken> {
        let url = format!("{}/{}/oauth2/token", self.authority, principal.tenant_id);
        debug!(tenant_id = %principal.tenant_id, resource = %resource, "Acquiring access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", principal.client_id.as_str()),
            ("client_secret", principal.client_secret.as_str()),
            ("resource", resource),
        ];

        let response = self.client.post(&url).form(&form).send().await.map_err(|e| {
            error!(error = %e, "Failed to send token request");
            AuthError::Request(format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Token endpoint returned error status");
            return Err(AuthError::Endpoint { status: status.as_u16(), body });
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse token response");
            AuthError::Response(format!("Failed to parse response: {}", e))
        })?;

        Ok(AccessToken {
            token: parsed.access_token,
            token_type: parsed.token_type,
            acquired_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> ServicePrincipal {
        ServicePrincipal::new(
            "tenant-1".to_string(),
            "client-1".to_string(),
            "secret".to_string(),
        )
    }

    #[test]
    fn test_bearer_header_value() {
        let token = AccessToken::bearer("abc123");
        assert_eq!(token.header_value(), "Bearer abc123");
    }

    #[tokio::test]
    async fn test_acquire_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant-1/oauth2/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                mockito::Matcher::UrlEncoded("client_id".into(), "client-1".into()),
                mockito::Matcher::UrlEncoded("client_secret".into(), "secret".into()),
                mockito::Matcher::UrlEncoded("resource".into(), "https://tracking".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "tok-1", "token_type": "Bearer"}"#)
            .create();

        let client = TokenClient::with_authority(server.url());
        let token = client.acquire(&principal(), "https://tracking").await.unwrap();

        assert_eq!(token.token, "tok-1");
        assert_eq!(token.header_value(), "Bearer tok-1");
        mock.assert();
    }

    #[tokio::test]
    async fn test_acquire_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tenant-1/oauth2/token")
            .with_status(401)
            .with_body(r#"{"error": "invalid_client"}"#)
            .create();

        let client = TokenClient::with_authority(server.url());
        let err = client.acquire(&principal(), "https://tracking").await.unwrap_err();

        match err {
            AuthError::Endpoint { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("expected endpoint error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_acquire_malformed_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tenant-1/oauth2/token")
            .with_status(200)
            .with_body("not json")
            .create();

        let client = TokenClient::with_authority(server.url());
        let err = client.acquire(&principal(), "https://tracking").await.unwrap_err();
        assert!(matches!(err, AuthError::Response(_)));
    }
}
