//! Client-side session core for the member portal.
//!
//! SYSTEM CONTEXT
//! ==============
//! Leaves first: `store` persists tokens and the cached profile, `net`
//! carries requests to the REST backend, `auth` owns login/logout/refresh
//! and the refresh-on-401 middleware, and `state` projects the session for
//! the view layer (session gate, route guard, portal loader). Nothing here
//! is a process-wide singleton; callers build an [`AuthClient`] and a
//! [`SessionGate`] and pass them where they are needed.

pub mod auth;
pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod store;

pub use auth::{AuthClient, RefreshOnUnauthorized};
pub use config::PortalConfig;
pub use error::AuthError;
pub use state::{Admission, RouteGuard, SessionGate, SessionSnapshot};
pub use store::TokenStore;
