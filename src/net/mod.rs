//! Network layer: transport seam, wire types, and typed portal calls.

pub mod api;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;
