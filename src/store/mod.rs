//! Token store: access/refresh tokens and the cached user profile.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store exclusively owns persisted session bytes. The auth client
//! borrows it per call; the session gate reads it once at startup. Keys
//! follow the portal's storage layout: `access_token`, `refresh_token`, and
//! `user` (JSON-serialized profile).

pub mod backend;

use std::sync::Arc;

use tracing::warn;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};

use crate::config::StorageKind;
use crate::error::AuthError;
use crate::net::types::{TokenPair, UserProfile};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Access => ACCESS_TOKEN_KEY,
            Self::Refresh => REFRESH_TOKEN_KEY,
        }
    }
}

/// Cheap-to-clone handle over a shared persistence backend.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl TokenStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Pick the backend named by configuration.
    #[must_use]
    pub fn from_kind(kind: &StorageKind) -> Self {
        match kind {
            StorageKind::Memory => Self::in_memory(),
            StorageKind::File(path) => Self::new(Arc::new(FileBackend::new(path.clone()))),
        }
    }

    /// Persist a whole login result (both tokens and the profile) in one
    /// backend write, so a failed write leaves no partial session behind.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if encoding or the backend write fails.
    pub async fn set_session(&self, tokens: &TokenPair, user: &UserProfile) -> Result<(), AuthError> {
        let raw = serde_json::to_string(user).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.backend
            .set_many(&[
                (ACCESS_TOKEN_KEY, tokens.access.clone()),
                (REFRESH_TOKEN_KEY, tokens.refresh.clone()),
                (USER_KEY, raw),
            ])
            .await
    }

    /// Replace only the access token (refresh flow).
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend write fails.
    pub async fn set_access_token(&self, token: &str) -> Result<(), AuthError> {
        self.backend.set_many(&[(ACCESS_TOKEN_KEY, token.to_owned())]).await
    }

    /// # Errors
    ///
    /// Returns `Storage` if the backend read fails.
    pub async fn get(&self, kind: TokenKind) -> Result<Option<String>, AuthError> {
        Ok(self.backend.get(kind.key()).await?.filter(|token| !token.is_empty()))
    }

    /// # Errors
    ///
    /// Returns `Storage` if the backend read fails.
    pub async fn access_token(&self) -> Result<Option<String>, AuthError> {
        self.get(TokenKind::Access).await
    }

    /// # Errors
    ///
    /// Returns `Storage` if the backend read fails.
    pub async fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        self.get(TokenKind::Refresh).await
    }

    /// Both tokens, or `None` unless both are present.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend read fails.
    pub async fn tokens(&self) -> Result<Option<TokenPair>, AuthError> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Ok(access.zip(refresh).map(|(access, refresh)| TokenPair { access, refresh }))
    }

    /// Overwrite the cached profile wholesale.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if encoding or the backend write fails.
    pub async fn set_user(&self, user: &UserProfile) -> Result<(), AuthError> {
        let raw = serde_json::to_string(user).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.backend.set_many(&[(USER_KEY, raw)]).await
    }

    /// Cached profile. An undecodable entry is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend read fails.
    pub async fn user(&self) -> Result<Option<UserProfile>, AuthError> {
        let Some(raw) = self.backend.get(USER_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "cached user profile is unreadable; ignoring it");
                Ok(None)
            }
        }
    }

    /// Session is "access token present".
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend read fails.
    pub async fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.access_token().await?.is_some())
    }

    /// Drop all three keys.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend write fails.
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.backend.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY]).await
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
