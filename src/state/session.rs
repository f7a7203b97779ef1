//! Session gate: the auth context handed to the view layer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views read `{user, is_authenticated, loading}` from here and never touch
//! tokens or raw errors. The gate performs one restoration pass at startup
//! from the token store and is mutated afterwards only through auth client
//! operations (login, logout, profile refresh). Expiry detected by the
//! client's refresh middleware reaches the gate through the client's status
//! channel.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::AuthClient;
use crate::error::AuthError;
use crate::net::types::{Credentials, LoginResponse, SessionStatus, UserProfile};

/// What the view layer sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub loading: bool,
}

impl SessionSnapshot {
    /// Initial state: restoration not yet finished.
    #[must_use]
    pub fn loading() -> Self {
        Self { user: None, is_authenticated: false, loading: true }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None, is_authenticated: false, loading: false }
    }

    #[must_use]
    pub fn authenticated(user: Option<UserProfile>) -> Self {
        Self { user, is_authenticated: true, loading: false }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::loading()
    }
}

pub struct SessionGate {
    client: AuthClient,
    state: watch::Sender<SessionSnapshot>,
    restore_timeout: Duration,
}

impl SessionGate {
    #[must_use]
    pub fn new(client: AuthClient, restore_timeout: Duration) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::loading());
        Self { client, state, restore_timeout }
    }

    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    #[must_use]
    pub fn restore_timeout(&self) -> Duration {
        self.restore_timeout
    }

    /// Restore from the token store. Optimistic: a stored access token is
    /// trusted without asking the server. Always ends with `loading = false`,
    /// including when the store fails or the restore timeout fires.
    pub async fn restore(&self) -> SessionSnapshot {
        let snapshot = match tokio::time::timeout(self.restore_timeout, self.read_cached_session()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!(error = %e, "session restore failed; continuing signed out");
                SessionSnapshot::anonymous()
            }
            Err(_) => {
                warn!(timeout_ms = self.restore_timeout.as_millis(), "session restore timed out; continuing signed out");
                SessionSnapshot::anonymous()
            }
        };

        self.client.set_status(if snapshot.is_authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        });
        info!(
            authenticated = snapshot.is_authenticated,
            user = snapshot.user.as_ref().map_or("-", |u| u.username.as_str()),
            "session restored"
        );
        self.publish(snapshot.clone());
        snapshot
    }

    async fn read_cached_session(&self) -> Result<SessionSnapshot, AuthError> {
        let store = self.client.store();
        if !store.is_authenticated().await? {
            return Ok(SessionSnapshot::anonymous());
        }
        Ok(SessionSnapshot::authenticated(store.user().await?))
    }

    /// Current projection. A session the client has since dropped (logout
    /// elsewhere, refresh failure, unrecoverable 401) reads as signed out.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let dropped = self.client.status() == SessionStatus::Anonymous;
        self.state.send_if_modified(|state| {
            if dropped && !state.loading && state.is_authenticated {
                *state = SessionSnapshot::anonymous();
                true
            } else {
                false
            }
        });
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.snapshot().user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Receiver that wakes whenever the projection changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// # Errors
    ///
    /// Whatever [`AuthClient::login`] returns; the projection is unchanged.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let response = self.client.login(credentials).await?;
        self.publish(SessionSnapshot::authenticated(Some(response.user.clone())));
        Ok(response)
    }

    /// The projection is signed out even if clearing the store fails.
    ///
    /// # Errors
    ///
    /// Whatever [`AuthClient::logout`] returns.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let result = self.client.logout().await;
        self.publish(SessionSnapshot::anonymous());
        result
    }

    /// Re-fetch the profile from the server into the cache and projection.
    ///
    /// # Errors
    ///
    /// Whatever [`AuthClient::profile`] returns. Terminal errors also sign
    /// the projection out.
    pub async fn refresh_profile(&self) -> Result<UserProfile, AuthError> {
        match self.client.profile().await {
            Ok(user) => {
                self.publish(SessionSnapshot::authenticated(Some(user.clone())));
                Ok(user)
            }
            Err(e) => {
                if e.is_terminal() {
                    self.publish(SessionSnapshot::anonymous());
                }
                Err(e)
            }
        }
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        self.state.send_replace(snapshot);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
