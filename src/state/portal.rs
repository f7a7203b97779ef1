//! Member portal loader.
//!
//! DESIGN
//! ======
//! The portal page always resolves. A missing session redirects before any
//! request is sent; an expired session (refresh failed, or the retry was
//! still 401) redirects after the fact. Every other failure degrades to
//! empty lists so the page renders with the cached user. The whole load is
//! bounded by a fallback timeout for the same reason.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::net::api::PortalApi;
use crate::net::transport::{build_url, is_absolute_url};
use crate::net::types::{ClassData, MemberPortalData, ResourceData, UserProfile};

pub const DEFAULT_PORTAL_FALLBACK: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "view", content = "data")]
pub enum PortalView {
    Redirect(String),
    Ready(PortalPage),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortalPage {
    pub user: Option<UserProfile>,
    pub classes: Vec<ClassData>,
    pub resources: Vec<ResourceData>,
    /// The fallback timer fired before the data arrived.
    pub timed_out: bool,
}

impl PortalPage {
    #[must_use]
    pub fn resource(&self, resource_id: i64) -> Option<&ResourceData> {
        self.resources.iter().find(|r| r.id == resource_id)
    }
}

enum Fetched {
    Data(MemberPortalData),
    Expired,
}

pub struct PortalLoader {
    api: PortalApi,
    base_url: String,
    login_path: String,
    fallback: Duration,
}

impl PortalLoader {
    #[must_use]
    pub fn new(api: PortalApi, base_url: impl Into<String>, login_path: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into(),
            login_path: login_path.into(),
            fallback: DEFAULT_PORTAL_FALLBACK,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Duration) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn fallback(&self) -> Duration {
        self.fallback
    }

    pub async fn load(&self) -> PortalView {
        let store = self.api.client().store();
        match store.access_token().await {
            Ok(Some(_)) => {}
            Ok(None) => return self.redirect(),
            Err(e) => {
                warn!(error = %e, "cannot read session; sending to login");
                return self.redirect();
            }
        }

        let fetched = tokio::time::timeout(self.fallback, self.fetch()).await;
        let user = store.user().await.unwrap_or_else(|e| {
            warn!(error = %e, "cached profile unavailable");
            None
        });

        match fetched {
            Ok(Fetched::Expired) => self.redirect(),
            Ok(Fetched::Data(data)) => {
                info!(classes = data.classes.len(), resources = data.resources.len(), "portal loaded");
                PortalView::Ready(PortalPage {
                    user,
                    classes: data.classes,
                    resources: data.resources,
                    timed_out: false,
                })
            }
            Err(_) => {
                warn!(timeout_ms = self.fallback.as_millis(), "portal load timed out; rendering without data");
                PortalView::Ready(PortalPage { user, timed_out: true, ..PortalPage::default() })
            }
        }
    }

    async fn fetch(&self) -> Fetched {
        match self.api.member_portal().await {
            Ok(data) => Fetched::Data(data),
            Err(e) if e.is_terminal() => {
                info!(error = %e, "session ended while loading portal");
                Fetched::Expired
            }
            Err(e) => {
                warn!(error = %e, "portal data unavailable; rendering empty lists");
                Fetched::Data(MemberPortalData::default())
            }
        }
    }

    fn redirect(&self) -> PortalView {
        PortalView::Redirect(self.login_path.clone())
    }

    /// Record a download and return the URL to open. The URL is returned
    /// even when tracking fails; the local count only moves on success.
    pub async fn track_download(&self, page: &mut PortalPage, resource_id: i64) -> Option<String> {
        let target = {
            let resource = page.resource(resource_id)?;
            resource
                .file
                .as_deref()
                .and_then(|file| self.media_url(Some(file)))
                .or_else(|| self.media_url(resource.external_link.as_deref()))
        };

        match self.api.record_download(resource_id).await {
            Ok(receipt) if receipt.success => {
                if let Some(resource) = page.resources.iter_mut().find(|r| r.id == resource_id) {
                    resource.download_count += 1;
                }
            }
            Ok(_) => warn!(resource_id, "download not recorded by server"),
            Err(e) => warn!(resource_id, error = %e, "download tracking failed"),
        }

        target
    }

    #[must_use]
    pub fn media_url(&self, value: Option<&str>) -> Option<String> {
        resolve_media_url(&self.base_url, value)
    }
}

/// Absolute `http(s)` URLs pass through; relative paths are joined to the
/// API base URL.
#[must_use]
pub fn resolve_media_url(base_url: &str, value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if is_absolute_url(value) {
        Some(value.to_owned())
    } else {
        Some(build_url(base_url, value))
    }
}

#[cfg(test)]
#[path = "portal_test.rs"]
mod portal_test;
