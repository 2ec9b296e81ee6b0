//! YAML network declaration.
//!
//! These structs mirror the configuration document one to one. Nothing
//! here knows about ports or rules: [`NetworkConfig::to_declaration`]
//! turns the document into the typed [`Declaration`] the topology builder
//! works on, parsing addresses and bandwidths along the way.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::LazyLock;

use crate::compiler::{CompileOptions, UnroutedPortPolicy};
use crate::export::dot::DiagramDirection;
use crate::ip::assign_host_addresses;
use crate::model::{
    Bandwidth, BoundaryRule, Controller, ControllerProtocol, Declaration, EndpointSpec, HostAddress,
    IsolationPolicy, LinkSpec, PortRef, Protocol, Slice, SwitchSpec,
};
use crate::utils::{bandwidth_from_mbit, parse_bandwidth, parse_host_address, parse_network};

/// Address base used when `general.ip_base` is not set
pub const DEFAULT_IP_BASE: &str = "10.0.0.0/8";

/// Highest value a 3-bit priority code point can take
const MAX_PRIORITY_TAG: u8 = 7;

/// Names end up in shell commands and diagram ids, so they stay shell-safe
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid name regex"));

/// Top-level configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub controllers: Vec<ControllerConfig>,
    pub switches: Vec<SwitchConfig>,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub slices: Vec<SliceConfig>,
    #[serde(default)]
    pub boundary_rules: Vec<BoundaryRuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Network name, used in the diagram title and the flow script
    pub name: String,
    /// Network hosts without an explicit `ip` draw their address from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_base: Option<String>,
    /// Fail on slices without access switches instead of warning
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub unrouted_ports: UnroutedPortPolicy,
    #[serde(default)]
    pub diagram_direction: DiagramDirection,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: "slicenet".to_string(),
            ip_base: None,
            strict: false,
            unrouted_ports: UnroutedPortPolicy::default(),
            diagram_direction: DiagramDirection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub name: String,
    pub ip: String,
    /// Defaults to 6633 plus the controller's position in the list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub protocol: ControllerProtocol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub name: String,
    /// Fail-over order; all controllers when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controllers: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub name: String,
    /// `a.b.c.d` or `a.b.c.d/len`; allocated from `ip_base` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Bandwidth as a bare Mbit/s figure or a string with unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BandwidthValue {
    Mbit(f64),
    Text(String),
}

impl BandwidthValue {
    pub fn to_bandwidth(&self) -> Result<Bandwidth, String> {
        match self {
            BandwidthValue::Mbit(mbit) => bandwidth_from_mbit(*mbit),
            BandwidthValue::Text(text) => parse_bandwidth(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<BandwidthValue>,
    /// Only needed for asymmetric declarations; must equal `bandwidth`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_bandwidth: Option<BandwidthValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceConfig {
    pub name: String,
    #[serde(default)]
    pub isolation: IsolationPolicy,
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Access switches of the slice
    #[serde(default)]
    pub switches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRuleConfig {
    pub switch: String,
    pub slice: String,
    pub priority: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    /// 802.1p priority code point (0-7)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<Vec<PortRef>>,
    pub egress: Vec<PortRef>,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid controller configuration: {0}")]
    InvalidController(String),
    #[error("Invalid switch configuration: {0}")]
    InvalidSwitch(String),
    #[error("Invalid host configuration: {0}")]
    InvalidHost(String),
    #[error("Invalid link configuration: {0}")]
    InvalidLink(String),
    #[error("Invalid slice configuration: {0}")]
    InvalidSlice(String),
    #[error("Invalid boundary rule: {0}")]
    InvalidRule(String),
}

impl NetworkConfig {
    /// Validate the configuration
    ///
    /// Checks what can be checked on the document alone: names are present,
    /// addresses and bandwidths parse, enum-like values are in range.
    /// Cross-references (unknown hosts, duplicate ports, ...) are the
    /// topology builder's job.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.name.trim().is_empty() {
            return Err(ValidationError::InvalidGeneral("name cannot be empty".to_string()));
        }
        check_name("network", &self.general.name).map_err(ValidationError::InvalidGeneral)?;
        if self.switches.is_empty() {
            return Err(ValidationError::InvalidSwitch("at least one switch is required".to_string()));
        }
        for switch in &self.switches {
            if switch.name.trim().is_empty() {
                return Err(ValidationError::InvalidSwitch("switch name cannot be empty".to_string()));
            }
            check_name("switch", &switch.name).map_err(ValidationError::InvalidSwitch)?;
        }
        for host in &self.hosts {
            if host.name.trim().is_empty() {
                return Err(ValidationError::InvalidHost("host name cannot be empty".to_string()));
            }
            check_name("host", &host.name).map_err(ValidationError::InvalidHost)?;
        }
        for controller in &self.controllers {
            check_name("controller", &controller.name).map_err(ValidationError::InvalidController)?;
        }
        for link in &self.links {
            if link.from.trim().is_empty() || link.to.trim().is_empty() {
                return Err(ValidationError::InvalidLink(format!(
                    "link '{}' - '{}' has an empty endpoint",
                    link.from, link.to
                )));
            }
        }
        for slice in &self.slices {
            if slice.name.trim().is_empty() {
                return Err(ValidationError::InvalidSlice("slice name cannot be empty".to_string()));
            }
            check_name("slice", &slice.name).map_err(ValidationError::InvalidSlice)?;
        }
        for (index, rule) in self.boundary_rules.iter().enumerate() {
            if let Some(tag) = rule.tag {
                if tag > MAX_PRIORITY_TAG {
                    return Err(ValidationError::InvalidRule(format!(
                        "rule #{} tag {} is out of range 0-{}",
                        index, tag, MAX_PRIORITY_TAG
                    )));
                }
            }
        }

        self.to_declaration().map(|_| ())
    }

    /// Network the unaddressed hosts are allocated from
    pub fn ip_base(&self) -> Result<HostAddress, ValidationError> {
        let base = self.general.ip_base.as_deref().unwrap_or(DEFAULT_IP_BASE);
        parse_network(base).map_err(|e| ValidationError::InvalidGeneral(format!("ip_base: {}", e)))
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            strict: self.general.strict,
            unrouted_ports: self.general.unrouted_ports,
        }
    }

    /// Convert the document into a typed declaration
    pub fn to_declaration(&self) -> Result<Declaration, ValidationError> {
        let base = self.ip_base()?;

        let controllers = self
            .controllers
            .iter()
            .enumerate()
            .map(|(index, c)| controller_from_config(index, c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut explicit = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            if host.name.trim().is_empty() {
                return Err(ValidationError::InvalidHost("host name cannot be empty".to_string()));
            }
            let address = host
                .ip
                .as_deref()
                .map(|ip| parse_host_address(ip, base.prefix_len))
                .transpose()
                .map_err(|e| ValidationError::InvalidHost(format!("{}: {}", host.name, e)))?;
            explicit.push((host.name.clone(), address));
        }
        let hosts = assign_host_addresses(&explicit, base).map_err(ValidationError::InvalidHost)?;

        let switches = self
            .switches
            .iter()
            .map(|s| SwitchSpec {
                id: s.name.clone(),
                controllers: s.controllers.clone(),
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(link_from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let slices = self
            .slices
            .iter()
            .map(|s| {
                Slice::new(s.name.clone(), s.isolation)
                    .with_hosts(s.hosts.iter().cloned())
                    .with_switches(s.switches.iter().cloned())
            })
            .collect();

        let boundary_rules = self
            .boundary_rules
            .iter()
            .map(|r| {
                let mut rule = BoundaryRule::new(r.switch.clone(), r.slice.clone(), r.priority, r.egress.clone());
                if let Some(protocol) = r.protocol {
                    rule = rule.with_protocol(protocol);
                }
                if let Some(tag) = r.tag {
                    rule = rule.with_priority_tag(tag);
                }
                if let Some(ingress) = &r.ingress {
                    rule = rule.with_ingress(ingress.clone());
                }
                rule
            })
            .collect();

        Ok(Declaration {
            hosts,
            switches,
            links,
            slices,
            boundary_rules,
            controllers,
        })
    }
}

fn check_name(kind: &str, name: &str) -> Result<(), String> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(format!(
            "{} name '{}' may only contain letters, digits, '_', '.' and '-'",
            kind,
            name.escape_debug()
        ))
    }
}

fn controller_from_config(index: usize, config: &ControllerConfig) -> Result<Controller, ValidationError> {
    if config.name.trim().is_empty() {
        return Err(ValidationError::InvalidController("controller name cannot be empty".to_string()));
    }
    let address: IpAddr = config.ip.trim().parse().map_err(|_| {
        ValidationError::InvalidController(format!("{}: invalid address '{}'", config.name, config.ip))
    })?;
    let port = match config.port {
        Some(0) => {
            return Err(ValidationError::InvalidController(format!("{}: port cannot be 0", config.name)));
        }
        Some(port) => port,
        None => u16::try_from(index)
            .ok()
            .and_then(|offset| Controller::DEFAULT_PORT.checked_add(offset))
            .ok_or_else(|| ValidationError::InvalidController(format!("{}: no default port left", config.name)))?,
    };
    let mut controller = Controller::new(config.name.clone(), address, port);
    controller.protocol = config.protocol;
    Ok(controller)
}

fn link_from_config(config: &LinkConfig) -> Result<LinkSpec, ValidationError> {
    let describe = |e: String| ValidationError::InvalidLink(format!("{} - {}: {}", config.from, config.to, e));
    let bandwidth = config.bandwidth.as_ref().map(BandwidthValue::to_bandwidth).transpose().map_err(describe)?;
    let reverse_bandwidth = config
        .reverse_bandwidth
        .as_ref()
        .map(BandwidthValue::to_bandwidth)
        .transpose()
        .map_err(describe)?;

    Ok(LinkSpec {
        a: EndpointSpec {
            node: config.from.clone(),
            port: config.from_port,
        },
        b: EndpointSpec {
            node: config.to.clone(),
            port: config.to_port,
        },
        bandwidth,
        reverse_bandwidth,
        qos_class: config.qos_class.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTERPRISE: &str = r#"
general:
  name: enterprise
  unrouted_ports: drop
  diagram_direction: LR
controllers:
  - { name: c0, ip: 127.0.0.1 }
  - { name: c1, ip: 127.0.0.1, port: 7000, protocol: ssl }
switches:
  - name: s1
  - name: s9
    controllers: [c1, c0]
hosts:
  - { name: h1, ip: 10.0.0.1/8 }
  - { name: h2 }
  - { name: srv1, ip: 10.0.0.2 }
links:
  - { from: h1, to: s1, bandwidth: 1 }
  - { from: h2, to: s1, bandwidth: "10 Mbit", qos_class: gold }
  - { from: s1, to: s9, to_port: 1 }
  - { from: s9, to: srv1, from_port: 5 }
slices:
  - { name: slice1, hosts: [h1, h2], switches: [s1] }
  - { name: shared, isolation: none, hosts: [srv1] }
boundary_rules:
  - { switch: s9, slice: slice1, priority: 5, protocol: udp, tag: 3, egress: [srv1, 5] }
"#;

    #[test]
    fn test_config_parsing() {
        let config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.diagram_direction, DiagramDirection::Lr);
        assert_eq!(
            config.compile_options(),
            CompileOptions {
                strict: false,
                unrouted_ports: UnroutedPortPolicy::Drop,
            }
        );

        let rule = &config.boundary_rules[0];
        assert_eq!(rule.protocol, Some(Protocol::Udp));
        assert_eq!(rule.egress, vec![PortRef::Peer("srv1".to_string()), PortRef::Number(5)]);
    }

    #[test]
    fn test_declaration_conversion() {
        let config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        let declaration = config.to_declaration().unwrap();

        // h2 has no address and skips the one srv1 claims
        let addresses: Vec<String> = declaration.hosts.iter().map(|h| h.address.to_string()).collect();
        assert_eq!(addresses, vec!["10.0.0.1/8", "10.0.0.3/8", "10.0.0.2/8"]);

        assert_eq!(declaration.controllers[0].port, 6633);
        assert_eq!(declaration.controllers[1].target(), "ssl:127.0.0.1:7000");
        assert_eq!(declaration.switches[1].controllers, Some(vec!["c1".to_string(), "c0".to_string()]));

        assert_eq!(declaration.links[0].bandwidth, Some(Bandwidth::from_mbit(1)));
        assert_eq!(declaration.links[1].bandwidth, Some(Bandwidth::from_mbit(10)));
        assert_eq!(declaration.links[2].b.port, Some(1));
        assert_eq!(declaration.slices[1].isolation, IsolationPolicy::None);
        assert_eq!(declaration.boundary_rules[0].priority_tag, Some(3));
    }

    #[test]
    fn test_validation_errors() {
        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.hosts[0].ip = Some("10.0.0.300".to_string());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidHost(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.links[0].bandwidth = Some(BandwidthValue::Text("fast".to_string()));
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLink(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.general.ip_base = Some("10.0.0.1/8".to_string());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.boundary_rules[0].tag = Some(9);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRule(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.controllers[0].ip = "localhost".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidController(_))));
    }

    #[test]
    fn test_unsafe_names_rejected() {
        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.switches[0].name = "s1; touch /tmp/owned".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSwitch(_)));
        assert!(err.to_string().contains("s1; touch /tmp/owned"));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.hosts[1].name = "h2$(reboot)".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidHost(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.slices[0].name = "slice 1".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSlice(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.controllers[1].name = "c1'".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidController(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.general.name = "lab\nrm -rf /".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));

        let mut config: NetworkConfig = serde_yaml::from_str(ENTERPRISE).unwrap();
        config.switches[0].name = "edge-1.rack_2".to_string();
        for link in &mut config.links {
            if link.from == "s1" {
                link.from = "edge-1.rack_2".to_string();
            }
            if link.to == "s1" {
                link.to = "edge-1.rack_2".to_string();
            }
        }
        config.slices[0].switches = vec!["edge-1.rack_2".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let yaml = ENTERPRISE.replace("isolation: none", "isolation: partial");
        assert!(serde_yaml::from_str::<NetworkConfig>(&yaml).is_err());

        let yaml = ENTERPRISE.replace("unrouted_ports: drop", "unrouted_ports: flood");
        assert!(serde_yaml::from_str::<NetworkConfig>(&yaml).is_err());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: NetworkConfig = serde_yaml::from_str("switches:\n  - name: s1\n").unwrap();
        assert_eq!(config.general, GeneralConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.ip_base().unwrap().to_string(), "10.0.0.0/8");
    }
}
