//! Topology type definitions.
//!
//! The [`Topology`] is the validated graph the policy and compiler layers
//! read from. All collections are ordered so that anything derived from it
//! (rules, exports) is reproducible.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Host, Link, Port, Slice, Switch, SwitchRole};

/// Validated network graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub hosts: BTreeMap<String, Host>,
    pub switches: BTreeMap<String, Switch>,
    pub links: Vec<Link>,
    pub slices: BTreeMap<String, Slice>,
}

impl Topology {
    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn switch(&self, id: &str) -> Option<&Switch> {
        self.switches.get(id)
    }

    pub fn slice(&self, id: &str) -> Option<&Slice> {
        self.slices.get(id)
    }

    /// Slice owning a node.
    ///
    /// Hosts belong to their slice, access switches to the slice they serve.
    /// Boundary switches belong to no slice.
    pub fn slice_of(&self, node: &str) -> Option<&str> {
        if let Some(host) = self.hosts.get(node) {
            return Some(&host.slice);
        }
        self.switches.get(node).and_then(|s| s.access_slice())
    }

    /// Slice whose traffic a switch port carries.
    ///
    /// A port facing a slice member carries that slice. On an access switch,
    /// the uplink towards a boundary switch carries the access switch's own
    /// slice. A boundary switch port facing another boundary switch carries
    /// no particular slice.
    pub fn port_slice<'a>(&'a self, switch: &'a Switch, port: &Port) -> Option<&'a str> {
        self.slice_of(&port.peer.node).or_else(|| switch.access_slice())
    }

    pub fn access_switches(&self) -> impl Iterator<Item = &Switch> {
        self.switches.values().filter(|s| s.is_access())
    }

    pub fn boundary_switches(&self) -> impl Iterator<Item = &Switch> {
        self.switches.values().filter(|s| s.role == SwitchRole::Boundary)
    }

    /// Hosts of a slice, in the slice's declaration order
    pub fn slice_hosts<'a>(&'a self, slice: &'a Slice) -> impl Iterator<Item = &'a Host> + 'a {
        slice.hosts.iter().filter_map(move |id| self.hosts.get(id))
    }
}
