//! Error taxonomy for the session core.
//!
//! DESIGN
//! ======
//! One enum covers every failure the auth client, token store, and portal
//! API can surface. The view layer only needs `is_terminal()` to decide
//! between "show a message" and "treat as logged out"; the session gate and
//! route guard never inspect the variants themselves.

/// Errors produced by session, storage, and API operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The login endpoint rejected the supplied credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The login endpoint failed with a 5xx or could not be reached.
    #[error("server error: {0}")]
    ServerError(String),

    /// A refresh was requested but no refresh token is stored.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The server rejected the refresh token. The local session is gone.
    #[error("token refresh failed")]
    RefreshFailed,

    /// A protected request stayed unauthorized after the single refresh.
    #[error("session expired; sign in again")]
    SessionExpired,

    /// An authenticated request was attempted without an access token.
    #[error("no access token available")]
    NoAccessToken,

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success status from a non-auth endpoint.
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },

    /// A response body could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The persistence backend failed to read or write.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether this failure ends the session (force logout + redirect).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::RefreshFailed | Self::SessionExpired)
    }
}
