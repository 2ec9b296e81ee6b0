//! Host address allocation.
//!
//! Hosts that do not declare an address receive one from the network's
//! address base, in declaration order, skipping every address that some
//! other host claims explicitly. The result is stable for a given
//! declaration: the same hosts in the same order always get the same
//! addresses.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use crate::model::{HostAddress, HostSpec};

/// Sequential allocator over one IPv4 network
#[derive(Debug)]
pub struct HostAddressAllocator {
    base: HostAddress,
    /// Next candidate address; u64 so the end of the range cannot overflow
    next: u64,
    taken: BTreeSet<Ipv4Addr>,
}

impl HostAddressAllocator {
    pub fn new(base: HostAddress) -> Self {
        Self {
            base,
            next: u64::from(u32::from(base.network())) + 1,
            taken: BTreeSet::new(),
        }
    }

    /// Mark an address as claimed so it is never handed out
    pub fn reserve(&mut self, ip: Ipv4Addr) {
        self.taken.insert(ip);
    }

    /// Last usable address of the network (the one before broadcast)
    fn last_usable(&self) -> u64 {
        let broadcast = u32::from(self.base.network()) | !self.base.mask();
        u64::from(broadcast).saturating_sub(1)
    }

    /// Hand out the next free address
    pub fn allocate(&mut self) -> Result<HostAddress, String> {
        let last = self.last_usable();
        while self.next <= last {
            let candidate = Ipv4Addr::from(self.next as u32);
            self.next += 1;
            if self.taken.insert(candidate) {
                return Ok(HostAddress::new(candidate, self.base.prefix_len));
            }
        }
        Err(format!("Address pool {} exhausted", self.base))
    }
}

/// Resolve the address of every host, allocating the missing ones
///
/// # Arguments
/// * `hosts` - `(host id, explicit address)` pairs in declaration order
/// * `base` - Network the missing addresses are drawn from
///
/// # Returns
/// Host specs in the same order, each with a concrete address. Duplicate
/// explicit addresses are left in place for the topology builder to reject.
pub fn assign_host_addresses(
    hosts: &[(String, Option<HostAddress>)],
    base: HostAddress,
) -> Result<Vec<HostSpec>, String> {
    let mut allocator = HostAddressAllocator::new(base);
    for (_, address) in hosts {
        if let Some(address) = address {
            allocator.reserve(address.ip);
        }
    }

    let mut specs = Vec::with_capacity(hosts.len());
    for (id, address) in hosts {
        let address = match address {
            Some(address) => *address,
            None => {
                let assigned = allocator
                    .allocate()
                    .map_err(|e| format!("{} while assigning an address to host '{}'", e, id))?;
                log::debug!("Assigned address {} to host {}", assigned, id);
                assigned
            }
        };
        specs.push(HostSpec { id: id.clone(), address });
    }
    Ok(specs)
}
