//! View-facing session state: the session gate, the route guard, and the
//! member portal loader built on top of them.

pub mod guard;
pub mod portal;
pub mod session;

pub use guard::{Admission, RouteGuard};
pub use portal::{PortalLoader, PortalPage, PortalView, resolve_media_url};
pub use session::{SessionGate, SessionSnapshot};
