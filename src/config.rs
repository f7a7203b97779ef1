//! Portal configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RESTORE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOGIN_PATH: &str = "/login";

const STORAGE_DIR: &str = ".tars-portal";
const STORAGE_FILE: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown PORTAL_STORAGE: {0} (expected 'memory' or 'file')")]
    UnknownStorage(String),
}

/// Where the token store keeps its keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// Process-lifetime map; nothing survives a restart.
    Memory,
    /// Device-local JSON file at the given path.
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub storage: StorageKind,
    pub timeouts: HttpTimeouts,
    pub restore_timeout_secs: u64,
    pub login_path: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            storage: StorageKind::File(default_storage_path()),
            timeouts: HttpTimeouts::default(),
            restore_timeout_secs: DEFAULT_RESTORE_TIMEOUT_SECS,
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
        }
    }
}

impl PortalConfig {
    /// Build typed portal config from environment variables.
    ///
    /// Optional:
    /// - `PORTAL_API_BASE_URL`: default `http://localhost:8000`
    /// - `PORTAL_STORAGE`: `file` (default) or `memory`
    /// - `PORTAL_STORAGE_PATH`: default `$HOME/.tars-portal/session.json`
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PORTAL_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PORTAL_RESTORE_TIMEOUT_SECS`: default 10
    /// - `PORTAL_LOGIN_PATH`: default `/login`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORTAL_STORAGE` names an unknown backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORTAL_STORAGE` names an unknown backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("PORTAL_API_BASE_URL")
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let storage = parse_storage(
            lookup("PORTAL_STORAGE").as_deref(),
            lookup("PORTAL_STORAGE_PATH").map(PathBuf::from),
        )?;
        let timeouts = HttpTimeouts {
            request_secs: parse_u64(lookup("PORTAL_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("PORTAL_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let restore_timeout_secs = parse_u64(lookup("PORTAL_RESTORE_TIMEOUT_SECS"), DEFAULT_RESTORE_TIMEOUT_SECS);
        let login_path = lookup("PORTAL_LOGIN_PATH")
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_owned());

        Ok(Self { api_base_url, storage, timeouts, restore_timeout_secs, login_path })
    }

    #[must_use]
    pub fn restore_timeout(&self) -> Duration {
        Duration::from_secs(self.restore_timeout_secs)
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn parse_storage(raw: Option<&str>, path: Option<PathBuf>) -> Result<StorageKind, ConfigError> {
    match raw.map(str::trim).unwrap_or("file") {
        "file" | "" => Ok(StorageKind::File(path.unwrap_or_else(default_storage_path))),
        "memory" => Ok(StorageKind::Memory),
        other => Err(ConfigError::UnknownStorage(other.to_owned())),
    }
}

fn default_storage_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(STORAGE_DIR)
        .join(STORAGE_FILE)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
