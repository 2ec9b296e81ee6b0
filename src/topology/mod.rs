//! Network topology module.
//!
//! This module assembles declared hosts, switches, links and slices into a
//! validated, immutable [`Topology`], assigning port numbers along the way.

pub mod types;
pub mod ports;
pub mod builder;

// Re-export key types and functions for easier access
pub use types::Topology;
pub use ports::assign_ports;
pub use builder::build;
