//! Slice and boundary-rule definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How traffic is forwarded inside a slice's access switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IsolationPolicy {
    /// Static full-mesh broadcast between all slice ports
    #[default]
    FullMesh,
    /// Default switching, confined to the slice's own switches
    None,
}

/// IP protocol a boundary rule can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    /// IANA protocol number
    pub fn number(&self) -> u8 {
        match self {
            Protocol::Icmp => 1,
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::Icmp => write!(f, "icmp"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "icmp" => Ok(Protocol::Icmp),
            other => Err(format!("Unknown protocol '{}'", other)),
        }
    }
}

/// Reference to a switch port, either by number or by the node on its far side
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    Number(u16),
    Peer(String),
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRef::Number(n) => write!(f, "{}", n),
            PortRef::Peer(node) => write!(f, "towards '{}'", node),
        }
    }
}

/// A logically isolated group of hosts and their access switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub id: String,
    pub hosts: Vec<String>,
    /// Access switches dedicated to this slice
    pub switches: Vec<String>,
    pub isolation: IsolationPolicy,
}

impl Slice {
    pub fn new(id: impl Into<String>, isolation: IsolationPolicy) -> Self {
        Self {
            id: id.into(),
            hosts: Vec::new(),
            switches: Vec::new(),
            isolation,
        }
    }

    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    pub fn with_switches<I, S>(mut self, switches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.switches.extend(switches.into_iter().map(Into::into));
        self
    }

    pub fn has_host(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == host)
    }

    pub fn has_switch(&self, switch: &str) -> bool {
        self.switches.iter().any(|s| s == switch)
    }
}

/// Forwarding rule for one slice's traffic at a boundary switch.
///
/// Rules at the same switch and ingress port must carry distinct priorities.
/// A rule with a protocol filter or priority tag is more specific than one
/// without and always sits above it in the compiled table, so the general
/// rule stays reachable for everything the filter does not catch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryRule {
    pub switch: String,
    pub slice: String,
    pub priority: u32,
    pub protocol: Option<Protocol>,
    pub priority_tag: Option<u8>,
    /// Explicit ingress ports; derived from slice membership when `None`
    pub ingress: Option<Vec<PortRef>>,
    pub egress: Vec<PortRef>,
}

impl BoundaryRule {
    pub fn new(switch: impl Into<String>, slice: impl Into<String>, priority: u32, egress: Vec<PortRef>) -> Self {
        Self {
            switch: switch.into(),
            slice: slice.into(),
            priority,
            protocol: None,
            priority_tag: None,
            ingress: None,
            egress,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_ingress(mut self, ingress: Vec<PortRef>) -> Self {
        self.ingress = Some(ingress);
        self
    }

    pub fn with_priority_tag(mut self, tag: u8) -> Self {
        self.priority_tag = Some(tag);
        self
    }
}
