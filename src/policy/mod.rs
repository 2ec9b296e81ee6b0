//! Slice policy.
//!
//! Resolves declared boundary rules against a validated topology: switch
//! and slice names are checked, port references are turned into concrete
//! port numbers, ingress ports are derived from slice membership where the
//! rule does not list them, and competing rules are detected.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CompileError, PolicyConflictError, StructuralError};
use crate::model::{BoundaryRule, PortRef, Protocol, Switch, SwitchRole};
use crate::topology::Topology;

/// A boundary rule with every port reference resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBoundaryRule {
    /// Position of the rule in the declaration
    pub index: usize,
    pub switch: String,
    pub slice: String,
    pub priority: u32,
    pub protocol: Option<Protocol>,
    pub priority_tag: Option<u8>,
    pub ingress: BTreeSet<u16>,
    pub egress: BTreeSet<u16>,
}

impl ResolvedBoundaryRule {
    /// Number of match fields beyond the ingress port
    pub fn specificity(&self) -> u8 {
        u8::from(self.protocol.is_some()) + u8::from(self.priority_tag.is_some())
    }
}

/// Boundary rules of a topology, resolved and conflict-free
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlicePolicy {
    rules: Vec<ResolvedBoundaryRule>,
}

impl SlicePolicy {
    /// Resolve and check boundary rules
    ///
    /// # Returns
    /// * `Err(CompileError::Structural)` for a rule on an unknown or access
    ///   switch, an unknown slice, or a port the switch does not have
    /// * `Err(CompileError::PolicyConflict)` when two rules claim the same
    ///   ingress port with the same priority
    pub fn resolve(topology: &Topology, rules: &[BoundaryRule]) -> Result<Self, CompileError> {
        let mut resolved = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            resolved.push(resolve_rule(topology, index, rule)?);
        }
        check_conflicts(&resolved)?;
        Ok(Self { rules: resolved })
    }

    pub fn rules(&self) -> &[ResolvedBoundaryRule] {
        &self.rules
    }

    /// Rules placed on `switch`, in declaration order
    pub fn rules_at<'a>(&'a self, switch: &'a str) -> impl Iterator<Item = &'a ResolvedBoundaryRule> + 'a {
        self.rules.iter().filter(move |r| r.switch == switch)
    }
}

fn resolve_rule(
    topology: &Topology,
    index: usize,
    rule: &BoundaryRule,
) -> Result<ResolvedBoundaryRule, StructuralError> {
    let switch = topology
        .switch(&rule.switch)
        .ok_or_else(|| StructuralError::UnknownRuleSwitch {
            rule: index,
            switch: rule.switch.clone(),
        })?;
    if let SwitchRole::Access { slice } = &switch.role {
        return Err(StructuralError::RuleOnAccessSwitch {
            rule: index,
            switch: switch.id.clone(),
            slice: slice.clone(),
        });
    }
    if topology.slice(&rule.slice).is_none() {
        return Err(StructuralError::UnknownRuleSlice {
            rule: index,
            slice: rule.slice.clone(),
        });
    }

    let egress = resolve_ports(switch, index, &rule.egress)?;
    if egress.is_empty() {
        return Err(StructuralError::EmptyEgress {
            rule: index,
            switch: switch.id.clone(),
        });
    }

    let ingress = match &rule.ingress {
        Some(refs) => resolve_ports(switch, index, refs)?,
        None => switch
            .ports
            .iter()
            .filter(|p| topology.port_slice(switch, p) == Some(rule.slice.as_str()))
            .map(|p| p.number)
            .collect(),
    };
    if ingress.is_empty() {
        return Err(StructuralError::NoIngress {
            rule: index,
            switch: switch.id.clone(),
            slice: rule.slice.clone(),
        });
    }

    Ok(ResolvedBoundaryRule {
        index,
        switch: switch.id.clone(),
        slice: rule.slice.clone(),
        priority: rule.priority,
        protocol: rule.protocol,
        priority_tag: rule.priority_tag,
        ingress,
        egress,
    })
}

/// Turn port references into port numbers present on `switch`
fn resolve_ports(switch: &Switch, rule: usize, refs: &[PortRef]) -> Result<BTreeSet<u16>, StructuralError> {
    let mut ports = BTreeSet::new();
    for port_ref in refs {
        let before = ports.len();
        match port_ref {
            PortRef::Number(number) => {
                if switch.port(*number).is_some() {
                    ports.insert(*number);
                }
            }
            PortRef::Peer(peer) => ports.extend(switch.ports_towards(peer).map(|p| p.number)),
        }
        if ports.len() == before && !already_listed(switch, &ports, port_ref) {
            return Err(StructuralError::UnknownRulePort {
                rule,
                switch: switch.id.clone(),
                port: port_ref.clone(),
            });
        }
    }
    Ok(ports)
}

/// A reference that resolves to ports already collected is a repeat, not a miss
fn already_listed(switch: &Switch, ports: &BTreeSet<u16>, port_ref: &PortRef) -> bool {
    match port_ref {
        PortRef::Number(number) => ports.contains(number),
        PortRef::Peer(peer) => {
            let mut towards = switch.ports_towards(peer).peekable();
            towards.peek().is_some() && towards.all(|p| ports.contains(&p.number))
        }
    }
}

/// Two rules on the same switch and ingress port must not share a priority
fn check_conflicts(rules: &[ResolvedBoundaryRule]) -> Result<(), PolicyConflictError> {
    let mut claimed: BTreeMap<(&str, u16, u32), usize> = BTreeMap::new();
    for rule in rules {
        for port in &rule.ingress {
            if let Some(first) = claimed.insert((rule.switch.as_str(), *port, rule.priority), rule.index) {
                return Err(PolicyConflictError {
                    switch: rule.switch.clone(),
                    port: *port,
                    priority: rule.priority,
                    first,
                    second: rule.index,
                });
            }
        }
    }
    Ok(())
}
