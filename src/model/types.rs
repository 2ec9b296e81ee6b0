//! Node, port and link definitions.
//!
//! Hosts and switches are both "nodes"; a link always joins two node
//! endpoints, each bound to one node-local port number.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;

/// Kind of node a link endpoint attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Host,
    Switch,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Host => write!(f, "host"),
            NodeKind::Switch => write!(f, "switch"),
        }
    }
}

/// Link bandwidth in bits per second.
///
/// Absence of a bandwidth on a link means "best effort"; the value is never
/// enforced here, only carried through to the exports so the shaping
/// collaborator sees the declared figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bandwidth(pub u64);

impl Bandwidth {
    pub const KBIT: u64 = 1_000;
    pub const MBIT: u64 = 1_000_000;
    pub const GBIT: u64 = 1_000_000_000;

    pub fn from_mbit(mbit: u64) -> Self {
        Self(mbit.saturating_mul(Self::MBIT))
    }

    pub fn bits_per_sec(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = [(Self::GBIT, "Gb/s"), (Self::MBIT, "Mb/s"), (Self::KBIT, "Kb/s")];
        for (unit, label) in units {
            if self.0 >= unit {
                let value = format!("{:.3}", self.0 as f64 / unit as f64);
                let value = value.trim_end_matches('0').trim_end_matches('.');
                return write!(f, "{} {}", value, label);
            }
        }
        write!(f, "{} b/s", self.0)
    }
}

/// IPv4 host address together with its prefix length (e.g. `10.0.0.1/8`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostAddress {
    pub ip: Ipv4Addr,
    pub prefix_len: u8,
}

impl HostAddress {
    pub fn new(ip: Ipv4Addr, prefix_len: u8) -> Self {
        Self { ip, prefix_len: prefix_len.min(32) }
    }

    /// Network mask for the prefix length
    pub fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_len))
        }
    }

    /// Network address (host bits cleared)
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.ip) & self.mask())
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

impl Serialize for HostAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Host as declared, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub id: String,
    pub address: HostAddress,
}

/// Switch as declared, before validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SwitchSpec {
    pub id: String,
    /// Explicit fail-over list of controller ids; `None` means "all controllers"
    pub controllers: Option<Vec<String>>,
}

/// One side of a declared link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub node: String,
    /// Explicit port number; assigned by the builder when absent
    pub port: Option<u16>,
}

impl EndpointSpec {
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into(), port: None }
    }

    pub fn with_port(node: impl Into<String>, port: u16) -> Self {
        Self { node: node.into(), port: Some(port) }
    }
}

/// Link as declared, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub a: EndpointSpec,
    pub b: EndpointSpec,
    /// Bandwidth in the a -> b direction
    pub bandwidth: Option<Bandwidth>,
    /// Bandwidth in the b -> a direction, if declared separately
    pub reverse_bandwidth: Option<Bandwidth>,
    pub qos_class: Option<String>,
}

impl LinkSpec {
    pub fn new(a: EndpointSpec, b: EndpointSpec) -> Self {
        Self {
            a,
            b,
            bandwidth: None,
            reverse_bandwidth: None,
            qos_class: None,
        }
    }

    pub fn with_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }
}

/// A resolved link endpoint: node, its kind and the port it is bound to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Endpoint {
    pub node: String,
    pub kind: NodeKind,
    pub port: u16,
}

/// A node-local port bound to exactly one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub number: u16,
    /// Index of the link in declaration order
    pub link: usize,
    /// The endpoint on the other side of the link
    pub peer: Endpoint,
}

/// Validated host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    pub id: String,
    pub address: HostAddress,
    /// Owning slice id (lookup only)
    pub slice: String,
    pub ports: Vec<Port>,
}

/// Role a switch plays in the slice layout
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum SwitchRole {
    /// Dedicated to a single slice
    Access { slice: String },
    /// Shared between slices, governed by boundary rules
    Boundary,
}

/// Validated switch with ports ordered by number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Switch {
    pub id: String,
    #[serde(flatten)]
    pub role: SwitchRole,
    pub ports: Vec<Port>,
}

impl Switch {
    pub fn port(&self, number: u16) -> Option<&Port> {
        self.ports.iter().find(|p| p.number == number)
    }

    /// Ports whose link leads to `peer`
    pub fn ports_towards<'a>(&'a self, peer: &'a str) -> impl Iterator<Item = &'a Port> + 'a {
        self.ports.iter().filter(move |p| p.peer.node == peer)
    }

    pub fn port_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().map(|p| p.number)
    }

    pub fn is_access(&self) -> bool {
        matches!(self.role, SwitchRole::Access { .. })
    }

    /// Slice served by this switch, if it is an access switch
    pub fn access_slice(&self) -> Option<&str> {
        match &self.role {
            SwitchRole::Access { slice } => Some(slice),
            SwitchRole::Boundary => None,
        }
    }
}

/// Validated, undirected link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub index: usize,
    pub a: Endpoint,
    pub b: Endpoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<Bandwidth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos_class: Option<String>,
}

impl Link {
    /// Endpoint on the opposite side of `node`
    pub fn opposite(&self, node: &str) -> Option<&Endpoint> {
        if self.a.node == node {
            Some(&self.b)
        } else if self.b.node == node {
            Some(&self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bandwidth_display() {
        assert_eq!(Bandwidth::from_mbit(1).to_string(), "1 Mb/s");
        assert_eq!(Bandwidth::from_mbit(10).to_string(), "10 Mb/s");
        assert_eq!(Bandwidth(1_500_000).to_string(), "1.5 Mb/s");
        assert_eq!(Bandwidth(2 * Bandwidth::GBIT).to_string(), "2 Gb/s");
        assert_eq!(Bandwidth(500_000).to_string(), "500 Kb/s");
        assert_eq!(Bandwidth(640).to_string(), "640 b/s");
    }

    #[test]
    fn test_host_address_network() {
        let addr = HostAddress::new(Ipv4Addr::new(10, 0, 0, 7), 8);
        assert_eq!(addr.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(addr.to_string(), "10.0.0.7/8");

        let any = HostAddress::new(Ipv4Addr::new(192, 168, 1, 1), 0);
        assert_eq!(any.network(), Ipv4Addr::new(0, 0, 0, 0));
    }

    #[test]
    fn test_link_opposite() {
        let link = Link {
            index: 0,
            a: Endpoint { node: "h1".into(), kind: NodeKind::Host, port: 1 },
            b: Endpoint { node: "s1".into(), kind: NodeKind::Switch, port: 3 },
            bandwidth: None,
            qos_class: None,
        };
        assert_eq!(link.opposite("h1").map(|e| e.port), Some(3));
        assert_eq!(link.opposite("s1").map(|e| e.node.as_str()), Some("h1"));
        assert!(link.opposite("s2").is_none());
    }
}
