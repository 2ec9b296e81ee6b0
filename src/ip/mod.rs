//! Host address management.

pub mod allocator;

pub use allocator::{assign_host_addresses, HostAddressAllocator};
