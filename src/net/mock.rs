//! Scripted transport and fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use super::types::UserProfile;
use crate::auth::AuthClient;
use crate::error::AuthError;
use crate::store::TokenStore;

// =========================================================================
// MockTransport
// =========================================================================

/// Replays queued responses in order and records every request it sees.
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, AuthError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub(crate) fn new(responses: Vec<Result<ApiResponse, AuthError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::NetworkError("no scripted response".into())))
    }
}

// =========================================================================
// Fixtures
// =========================================================================

pub(crate) fn json_response(status: u16, body: serde_json::Value) -> Result<ApiResponse, AuthError> {
    Ok(ApiResponse::new(status, body.to_string()))
}

pub(crate) fn offline() -> Result<ApiResponse, AuthError> {
    Err(AuthError::NetworkError("connection refused".into()))
}

pub(crate) fn alice() -> UserProfile {
    UserProfile {
        id: 1,
        username: "alice".into(),
        email: "alice@tars.test".into(),
        first_name: "Alice".into(),
        last_name: "Liddell".into(),
        is_staff: false,
    }
}

pub(crate) fn login_body(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "message": "Login successful",
        "user": alice(),
        "tokens": { "access": access, "refresh": refresh }
    })
}

/// Client over an in-memory store and the given scripted responses.
pub(crate) fn client_with(responses: Vec<Result<ApiResponse, AuthError>>) -> (AuthClient, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new(responses));
    let client = AuthClient::new(mock.clone(), TokenStore::in_memory());
    (client, mock)
}

/// Client whose store already holds `access`/`refresh` and the alice profile.
pub(crate) async fn signed_in_client(
    access: &str,
    refresh: &str,
    responses: Vec<Result<ApiResponse, AuthError>>,
) -> (AuthClient, Arc<MockTransport>) {
    let (client, mock) = client_with(responses);
    client
        .store()
        .set_session(&crate::net::types::TokenPair { access: access.into(), refresh: refresh.into() }, &alice())
        .await
        .unwrap();
    (client, mock)
}
