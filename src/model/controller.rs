//! Controller and fail-over group definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Transport used to reach a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControllerProtocol {
    #[default]
    Tcp,
    Ssl,
}

impl fmt::Display for ControllerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerProtocol::Tcp => write!(f, "tcp"),
            ControllerProtocol::Ssl => write!(f, "ssl"),
        }
    }
}

/// A southbound controller endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controller {
    pub id: String,
    pub address: IpAddr,
    pub protocol: ControllerProtocol,
    pub port: u16,
}

impl Controller {
    /// Default OpenFlow controller port
    pub const DEFAULT_PORT: u16 = 6633;

    pub fn new(id: impl Into<String>, address: IpAddr, port: u16) -> Self {
        Self {
            id: id.into(),
            address,
            protocol: ControllerProtocol::Tcp,
            port,
        }
    }

    /// Connection target in `proto:ip:port` form
    pub fn target(&self) -> String {
        match self.address {
            IpAddr::V4(ip) => format!("{}:{}:{}", self.protocol, ip, self.port),
            IpAddr::V6(ip) => format!("{}:[{}]:{}", self.protocol, ip, self.port),
        }
    }
}

/// Ordered controllers serving one switch; the first one is primary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerGroup {
    pub switch: String,
    pub controllers: Vec<Controller>,
}

impl ControllerGroup {
    pub fn primary(&self) -> Option<&Controller> {
        self.controllers.first()
    }

    /// Controllers after the primary, in fail-over order
    pub fn backups(&self) -> &[Controller] {
        self.controllers.get(1..).unwrap_or(&[])
    }
}
