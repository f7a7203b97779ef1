//! Typed calls for the portal endpoints.
//!
//! Protected endpoints go through [`AuthClient::fetch_with_auth`] so they
//! share the refresh-on-401 policy. Public endpoints (health, info, home)
//! use the raw transport and never carry a bearer token.

use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use super::types::{ApiInfo, DownloadReceipt, HealthCheck, MemberPortalData};
use crate::auth::AuthClient;
use crate::error::AuthError;

pub const PORTAL_PATH: &str = "/api/portal/";
pub const HEALTH_PATH: &str = "/api/health/";
pub const INFO_PATH: &str = "/api/info/";
pub const HOME_PATH: &str = "/api/home/";

fn resource_download_path(resource_id: i64) -> String {
    format!("/api/resources/{resource_id}/download/")
}

#[derive(Clone)]
pub struct PortalApi {
    client: AuthClient,
}

impl PortalApi {
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    /// Classes and resources for the signed-in member.
    ///
    /// # Errors
    ///
    /// Any `fetch_with_auth` error, `Http` for a non-2xx, or `Decode`.
    pub async fn member_portal(&self) -> Result<MemberPortalData, AuthError> {
        let response = self.client.fetch_with_auth(&ApiRequest::get(PORTAL_PATH)).await?;
        response.error_for_status()?.json()
    }

    /// Bump the download counter for a resource.
    ///
    /// # Errors
    ///
    /// Any `fetch_with_auth` error, `Http` for a non-2xx, or `Decode`.
    pub async fn record_download(&self, resource_id: i64) -> Result<DownloadReceipt, AuthError> {
        let request = ApiRequest::post(resource_download_path(resource_id), serde_json::json!({}));
        let response = self.client.fetch_with_auth(&request).await?;
        response.error_for_status()?.json()
    }

    /// # Errors
    ///
    /// `NetworkError`, `Http` for a non-2xx, or `Decode`.
    pub async fn health(&self) -> Result<HealthCheck, AuthError> {
        self.get_public(HEALTH_PATH).await?.json()
    }

    /// # Errors
    ///
    /// `NetworkError`, `Http` for a non-2xx, or `Decode`.
    pub async fn info(&self) -> Result<ApiInfo, AuthError> {
        self.get_public(INFO_PATH).await?.json()
    }

    /// Landing-page payload. Its shape is owned by the backend, so it stays
    /// untyped.
    ///
    /// # Errors
    ///
    /// `NetworkError`, `Http` for a non-2xx, or `Decode`.
    pub async fn home(&self) -> Result<serde_json::Value, AuthError> {
        self.get_public(HOME_PATH).await?.json()
    }

    async fn get_public(&self, path: &str) -> Result<ApiResponse, AuthError> {
        self.client
            .transport()
            .send(&ApiRequest::get(path))
            .await?
            .error_for_status()
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
