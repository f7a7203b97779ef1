//! Token lifecycle: the auth client and its refresh middleware.

pub mod client;
pub mod middleware;

pub use client::AuthClient;
pub use middleware::{MAX_REFRESH_ATTEMPTS, RefreshOnUnauthorized};
