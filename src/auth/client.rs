//! Auth client: login, logout, token refresh, authenticated fetch.
//!
//! DESIGN
//! ======
//! `AuthClient` is an explicitly constructed handle (transport + token store
//! + status channel). Clones share all three, so the session gate, the
//! portal API, and the refresh middleware observe one session.
//!
//! Session status lives in a `watch` channel:
//! - `Unknown -> Authenticated | Anonymous` once the gate restores the store
//! - `Authenticated -> Anonymous` on logout, refresh failure, or an
//!   unrecoverable 401
//! - `Anonymous -> Authenticated` only through a successful `login()`
//!
//! A transition to `Anonymous` is the redirect-to-login signal for views.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::middleware::RefreshOnUnauthorized;
use crate::config::PortalConfig;
use crate::error::AuthError;
use crate::net::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::net::types::{Credentials, LoginResponse, RefreshResponse, SessionStatus, UserProfile};
use crate::store::TokenStore;

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const LOGOUT_PATH: &str = "/api/auth/logout/";
pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";
pub const PROFILE_PATH: &str = "/api/auth/profile/";

const LOGIN_FAILED_MESSAGE: &str = "Login failed";

#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn HttpTransport>,
    store: TokenStore,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl AuthClient {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, store: TokenStore) -> Self {
        let (status, _) = watch::channel(SessionStatus::Unknown);
        Self { transport, store, status: Arc::new(status) }
    }

    /// Build a client with the `reqwest` transport and the configured store.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be constructed.
    pub fn from_config(config: &PortalConfig) -> Result<Self, AuthError> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.timeouts)?;
        Ok(Self::new(Arc::new(transport), TokenStore::from_kind(&config.storage)))
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub(crate) fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Receiver that wakes on every status transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(?previous, current = ?status, "session status changed");
        }
    }

    /// Whether an access token is currently stored.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read.
    pub async fn is_authenticated(&self) -> Result<bool, AuthError> {
        self.store.is_authenticated().await
    }

    // =========================================================================
    // LOGIN / LOGOUT
    // =========================================================================

    /// Exchange credentials for a token pair and profile, then persist all
    /// three in one write.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for a 4xx, with the server's message when given
    /// - `ServerError` for a 5xx or an unreachable server
    /// - `Decode` if the body is malformed or either token is empty
    /// - `Storage` if the write fails (nothing is persisted)
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let request = ApiRequest::post(
            LOGIN_PATH,
            json!({ "username": credentials.username, "password": credentials.password }),
        );
        let response = self.transport.send(&request).await.map_err(|e| match e {
            AuthError::NetworkError(message) => AuthError::ServerError(message),
            other => other,
        })?;

        if !response.is_success() {
            warn!(status = response.status, username = %credentials.username, "login rejected");
            return Err(login_error(&response));
        }

        let data: LoginResponse = response.json()?;
        if data.tokens.access.trim().is_empty() || data.tokens.refresh.trim().is_empty() {
            warn!(username = %credentials.username, "login response is missing a token");
            return Err(AuthError::Decode("login response carried an empty token".into()));
        }
        self.store.set_session(&data.tokens, &data.user).await?;
        self.set_status(SessionStatus::Authenticated);
        info!(user_id = data.user.id, username = %data.user.username, "logged in");
        Ok(data)
    }

    /// Best-effort server logout, then unconditional local clear.
    ///
    /// # Errors
    ///
    /// Returns `Storage` only if the local store still cannot be cleared
    /// after one retry; the session status is `Anonymous` either way.
    pub async fn logout(&self) -> Result<(), AuthError> {
        match self.store.refresh_token().await {
            Ok(Some(refresh)) => self.notify_logout(refresh).await,
            Ok(None) => debug!("no refresh token; skipping server logout"),
            Err(e) => warn!(error = %e, "could not read refresh token before logout"),
        }

        self.set_status(SessionStatus::Anonymous);
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "clearing session store failed; retrying once");
            self.store.clear().await?;
        }
        info!("logged out");
        Ok(())
    }

    async fn notify_logout(&self, refresh: String) {
        let mut request = ApiRequest::post(LOGOUT_PATH, json!({ "refresh_token": refresh }));
        request.bearer = self.store.access_token().await.ok().flatten();

        match self.transport.send(&request).await {
            Ok(response) if response.is_success() => debug!("server logout acknowledged"),
            Ok(response) => warn!(status = response.status, "server logout rejected; clearing locally"),
            Err(e) => warn!(error = %e, "server logout failed; clearing locally"),
        }
    }

    // =========================================================================
    // REFRESH
    // =========================================================================

    /// Mint a new access token from the stored refresh token.
    ///
    /// # Errors
    ///
    /// - `NoRefreshToken` if none is stored (store untouched)
    /// - `RefreshFailed` if the server rejects it (store cleared)
    /// - `NetworkError` if the server is unreachable (store untouched)
    pub async fn refresh_token(&self) -> Result<String, AuthError> {
        let Some(refresh) = self.store.refresh_token().await? else {
            return Err(AuthError::NoRefreshToken);
        };

        let request = ApiRequest::post(REFRESH_PATH, json!({ "refresh": refresh }));
        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            warn!(status = response.status, "token refresh rejected; clearing session");
            self.invalidate().await;
            return Err(AuthError::RefreshFailed);
        }

        let body: RefreshResponse = response.json()?;
        self.store.set_access_token(&body.access).await?;
        info!("access token refreshed");
        Ok(body.access)
    }

    /// Drop the local session and publish `Anonymous`. Storage failures are
    /// logged; the status change still happens.
    pub(crate) async fn invalidate(&self) {
        self.set_status(SessionStatus::Anonymous);
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear session store");
        }
    }

    // =========================================================================
    // AUTHENTICATED REQUESTS
    // =========================================================================

    /// Send `request` with the stored bearer token, refreshing once on 401.
    ///
    /// # Errors
    ///
    /// - `NoAccessToken` if no access token is stored
    /// - `SessionExpired` if the refresh fails or the retry is still 401
    /// - `NetworkError` for transport failures
    pub async fn fetch_with_auth(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.authenticated().send(request).await
    }

    /// The refresh-and-retry decorator over this client's transport.
    #[must_use]
    pub fn authenticated(&self) -> RefreshOnUnauthorized {
        RefreshOnUnauthorized::new(self.clone())
    }

    /// Fetch the current user from the server and overwrite the cached copy.
    ///
    /// # Errors
    ///
    /// Any `fetch_with_auth` error, `Http` for a non-2xx, or `Decode`.
    pub async fn profile(&self) -> Result<UserProfile, AuthError> {
        let response = self.fetch_with_auth(&ApiRequest::get(PROFILE_PATH)).await?;
        let user: UserProfile = response.error_for_status()?.json()?;
        self.store.set_user(&user).await?;
        Ok(user)
    }
}

fn login_error(response: &ApiResponse) -> AuthError {
    let message = response
        .error_message()
        .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_owned());
    if response.status >= 500 {
        AuthError::ServerError(message)
    } else {
        AuthError::InvalidCredentials(message)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
