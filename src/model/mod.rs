//! Entity model.
//!
//! Typed records for everything a network declaration can contain: hosts,
//! switches, ports, links, slices, boundary rules and controllers. The
//! `*Spec` types are the raw declarations handed to the topology builder;
//! the remaining types are the validated, immutable entities it produces.

pub mod types;
pub mod slice;
pub mod controller;

pub use types::{
    Bandwidth, Endpoint, EndpointSpec, Host, HostAddress, HostSpec, Link, LinkSpec, NodeKind,
    Port, Switch, SwitchRole, SwitchSpec,
};
pub use slice::{BoundaryRule, IsolationPolicy, PortRef, Protocol, Slice};
pub use controller::{Controller, ControllerGroup, ControllerProtocol};

/// A complete, declarative description of a network.
///
/// This is what the configuration layer produces and what the rest of the
/// pipeline consumes. Nothing in it has been cross-checked yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declaration {
    pub hosts: Vec<HostSpec>,
    pub switches: Vec<SwitchSpec>,
    pub links: Vec<LinkSpec>,
    pub slices: Vec<Slice>,
    pub boundary_rules: Vec<BoundaryRule>,
    pub controllers: Vec<Controller>,
}
