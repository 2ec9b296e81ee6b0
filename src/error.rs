//! Error types for topology validation and rule compilation.
//!
//! Every error names the offending entity (switch, port, slice, host) so the
//! caller can point at the exact declaration. Compilation is all-or-nothing:
//! any of these errors means no rules were produced.

use thiserror::Error;

use crate::model::{Bandwidth, PortRef};

/// Malformed topology or policy structure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("Node id '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("Link {link} references unknown node '{node}'")]
    DanglingEndpoint { link: usize, node: String },

    #[error("Link {link} connects '{node}' to itself")]
    SelfLoop { link: usize, node: String },

    #[error("Port {port} on '{node}' is bound to more than one link")]
    DuplicatePort { node: String, port: u16 },

    #[error("Port 0 on '{node}' is invalid, port numbers start at 1")]
    InvalidPort { node: String },

    #[error("Node '{node}' has no free port numbers left")]
    PortsExhausted { node: String },

    #[error("Address {address} is assigned to both '{first}' and '{second}'")]
    DuplicateAddress { address: String, first: String, second: String },

    #[error("Slice id '{0}' is declared more than once")]
    DuplicateSlice(String),

    #[error("Host '{host}' is claimed by {} slices {slices:?}, expected exactly one", .slices.len())]
    HostSliceCount { host: String, slices: Vec<String> },

    #[error("Slice '{slice}' references unknown host '{host}'")]
    UnknownSliceHost { slice: String, host: String },

    #[error("Slice '{slice}' references unknown switch '{switch}'")]
    UnknownSliceSwitch { slice: String, switch: String },

    #[error("Access switch '{switch}' is claimed by several slices {slices:?}")]
    SharedAccessSwitch { switch: String, slices: Vec<String> },

    #[error("Link {link} joins '{a}' (slice '{a_slice}') to '{b}' (slice '{b_slice}') outside a boundary switch")]
    CrossSliceLink {
        link: usize,
        a: String,
        a_slice: String,
        b: String,
        b_slice: String,
    },

    #[error("Link {link} between '{a}' and '{b}' declares {forward} forward but {reverse} reverse bandwidth")]
    BandwidthMismatch {
        link: usize,
        a: String,
        b: String,
        forward: Bandwidth,
        reverse: Bandwidth,
    },

    #[error("Boundary rule #{rule} targets unknown switch '{switch}'")]
    UnknownRuleSwitch { rule: usize, switch: String },

    #[error("Boundary rule #{rule} targets '{switch}', an access switch of slice '{slice}'")]
    RuleOnAccessSwitch { rule: usize, switch: String, slice: String },

    #[error("Boundary rule #{rule} names unknown slice '{slice}'")]
    UnknownRuleSlice { rule: usize, slice: String },

    #[error("Boundary rule #{rule} references port {port} which switch '{switch}' does not have")]
    UnknownRulePort { rule: usize, switch: String, port: PortRef },

    #[error("Boundary rule #{rule} at '{switch}' has an empty egress set")]
    EmptyEgress { rule: usize, switch: String },

    #[error("Boundary rule #{rule} at '{switch}' has no ingress port carrying slice '{slice}'")]
    NoIngress { rule: usize, switch: String, slice: String },

    #[error("Boundary rule #{rule} at '{switch}' would only send ingress port {port} traffic back out of port {port}")]
    EgressLoop { rule: usize, switch: String, port: u16 },

    #[error("Controller id '{0}' is declared more than once")]
    DuplicateController(String),

    #[error("Switch '{switch}' has no controller assigned")]
    NoController { switch: String },

    #[error("Switch '{switch}' references unknown controller '{controller}'")]
    UnknownController { switch: String, controller: String },

    #[error("Switch '{switch}' lists controller '{controller}' more than once")]
    RepeatedController { switch: String, controller: String },
}

/// Two boundary rules compete for the same ingress port with the same priority
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Boundary rules #{first} and #{second} at switch '{switch}' both claim ingress port {port} with priority {priority}")]
pub struct PolicyConflictError {
    pub switch: String,
    pub port: u16,
    pub priority: u32,
    pub first: usize,
    pub second: usize,
}

/// A slice without any access switch (strict mode only)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Slice '{slice}' has no access switch and is unreachable")]
pub struct UnreachableSliceError {
    pub slice: String,
}

/// Any failure that prevents a rule set from being produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    PolicyConflict(#[from] PolicyConflictError),

    #[error(transparent)]
    UnreachableSlice(#[from] UnreachableSliceError),
}

impl CompileError {
    pub fn is_structural(&self) -> bool {
        matches!(self, CompileError::Structural(_))
    }
}

/// Result type for compilation operations
pub type CompileResult<T> = Result<T, CompileError>;
