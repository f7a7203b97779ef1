//! Wire DTOs for the portal REST API.
//!
//! DESIGN
//! ======
//! Auth types (`Credentials`, `TokenPair`, `UserProfile`, `LoginResponse`)
//! are decoded strictly because the cached profile must round-trip exactly.
//! Portal content types (`ClassData`, `ResourceData`, ...) use
//! `#[serde(default)]` so a backend that adds or omits display fields does
//! not break the member portal.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// AUTH
// =============================================================================

/// Login input. Transient: never persisted, never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access/refresh bearer pair issued at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Cached copy of the server's user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

impl UserProfile {
    /// "First Last", falling back to the username when both are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() { self.username.clone() } else { full.to_owned() }
    }
}

/// Body of a successful `POST /api/auth/login/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
}

/// Client-side session status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Startup, before the store has been consulted.
    #[default]
    Unknown,
    Authenticated,
    Anonymous,
}

// =============================================================================
// PORTAL CONTENT
// =============================================================================

/// A class/workshop as listed in the member portal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassData {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub difficulty: String,
    pub difficulty_display: String,
    pub status: String,
    pub status_display: String,
    /// `online`, `offline`, or `hybrid`.
    pub mode: String,
    pub mode_display: String,
    pub thumbnail: Option<String>,
    pub start_date: String,
    pub start_date_formatted: String,
    pub end_date: Option<String>,
    pub duration: String,
    pub max_participants: i64,
    pub enrolled_count: i64,
    pub is_full: bool,
    pub is_joinable: bool,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub syllabus: Option<String>,
    pub is_active: bool,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A learning resource as listed in the member portal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceData {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub category_display: String,
    pub thumbnail: Option<String>,
    pub file: Option<String>,
    pub external_link: Option<String>,
    pub author: Option<String>,
    pub tags: Option<String>,
    pub tag_list: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub download_count: i64,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `GET /api/portal/`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberPortalData {
    pub classes: Vec<ClassData>,
    pub resources: Vec<ResourceData>,
}

/// Body of `POST /api/resources/{id}/download/`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadReceipt {
    pub success: bool,
    pub download_count: i64,
}

/// Body of `GET /api/health/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub database: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    pub health: String,
    pub admin: String,
    pub info: String,
}

/// Body of `GET /api/info/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub endpoints: ApiEndpoints,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
