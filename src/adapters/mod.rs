//! Adapters - implementations of ports for external systems.

pub mod ai;
pub mod store;
