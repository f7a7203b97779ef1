//! Refresh-on-401 decorator over the HTTP transport.
//!
//! DESIGN
//! ======
//! `RefreshOnUnauthorized` wraps an [`AuthClient`] and is itself an
//! [`HttpTransport`]: it attaches the stored access token, and on a 401 it
//! refreshes and retries, at most `max_refreshes` times (default 1). When the
//! budget is spent or a refresh fails, the session is invalidated and the
//! call ends with `SessionExpired`. A persistently failing backend therefore
//! costs at most `1 + max_refreshes` requests.

use tracing::{debug, warn};

use super::client::AuthClient;
use crate::error::AuthError;
use crate::net::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Refresh-and-retry cycles allowed per request.
pub const MAX_REFRESH_ATTEMPTS: u8 = 1;

pub struct RefreshOnUnauthorized {
    client: AuthClient,
    max_refreshes: u8,
}

impl RefreshOnUnauthorized {
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self::with_limit(client, MAX_REFRESH_ATTEMPTS)
    }

    #[must_use]
    pub fn with_limit(client: AuthClient, max_refreshes: u8) -> Self {
        Self { client, max_refreshes }
    }

    #[must_use]
    pub fn max_refreshes(&self) -> u8 {
        self.max_refreshes
    }

    async fn expire(&self) -> AuthError {
        self.client.invalidate().await;
        AuthError::SessionExpired
    }
}

#[async_trait::async_trait]
impl HttpTransport for RefreshOnUnauthorized {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let Some(mut token) = self.client.store().access_token().await? else {
            return Err(AuthError::NoAccessToken);
        };

        let mut refreshes = 0_u8;
        loop {
            let attempt = request.clone().with_bearer(token);
            let response = self.client.transport().send(&attempt).await?;
            if !response.is_unauthorized() {
                return Ok(response);
            }

            if refreshes >= self.max_refreshes {
                warn!(path = %request.path, refreshes, "still unauthorized after refresh; session expired");
                return Err(self.expire().await);
            }
            refreshes += 1;

            token = match self.client.refresh_token().await {
                Ok(token) => token,
                Err(e) => {
                    warn!(path = %request.path, error = %e, "refresh after 401 failed; session expired");
                    return Err(self.expire().await);
                }
            };
            debug!(path = %request.path, refreshes, "retrying with refreshed access token");
        }
    }
}

#[cfg(test)]
#[path = "middleware_test.rs"]
mod middleware_test;
