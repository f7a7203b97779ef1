//! Route guard for protected views.
//!
//! Admission rule: wait while the session is still loading, admit when
//! authenticated, otherwise redirect to the login route. `decide` never
//! redirects during loading; `wait_for_admission` gives up on a gate that
//! is still loading once the restore timeout has passed.

use serde::Serialize;
use tracing::warn;

use super::session::{SessionGate, SessionSnapshot};

pub const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "admission", content = "to")]
pub enum Admission {
    /// Restoration still in progress; render a placeholder.
    Pending,
    Admit,
    Redirect(String),
}

#[derive(Clone, Debug)]
pub struct RouteGuard {
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH)
    }
}

impl RouteGuard {
    #[must_use]
    pub fn new(login_path: impl Into<String>) -> Self {
        Self { login_path: login_path.into() }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn decide(&self, snapshot: &SessionSnapshot) -> Admission {
        if snapshot.loading {
            Admission::Pending
        } else if snapshot.is_authenticated {
            Admission::Admit
        } else {
            Admission::Redirect(self.login_path.clone())
        }
    }

    /// Wait out the loading phase, then decide. The wait is bounded by the
    /// gate's restore timeout; a gate still loading after that (for example
    /// one whose `restore()` never ran) is treated as signed out.
    pub async fn wait_for_admission(&self, gate: &SessionGate) -> Admission {
        // Subscribe before reading so a restore finishing in between still wakes us.
        let mut rx = gate.subscribe();
        let settled = async {
            loop {
                let admission = self.decide(&gate.snapshot());
                if admission != Admission::Pending {
                    return admission;
                }
                // The gate owns the sender, so this only resolves on a change.
                let _ = rx.changed().await;
            }
        };

        match tokio::time::timeout(gate.restore_timeout(), settled).await {
            Ok(admission) => admission,
            Err(_) => match self.decide(&gate.snapshot()) {
                Admission::Pending => {
                    warn!(login_path = %self.login_path, "session still loading; redirecting");
                    Admission::Redirect(self.login_path.clone())
                }
                admission => admission,
            },
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;
