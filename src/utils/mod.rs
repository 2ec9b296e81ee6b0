//! Shared utilities: address and bandwidth parsing.

pub mod bandwidth;
pub mod ip_utils;

pub use bandwidth::{bandwidth_from_mbit, parse_bandwidth};
pub use ip_utils::{parse_host_address, parse_network};
