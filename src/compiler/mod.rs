//! Flow-rule compiler.
//!
//! Turns a validated [`Topology`] and its [`SlicePolicy`] into one ordered
//! flow table per switch. Access switches get intra-slice rules (see
//! [`mesh`]), boundary switches get the resolved boundary rules (see
//! [`boundary`]). Compilation is a pure function: the same inputs always
//! give the same [`RuleSet`], and any error means no rules at all.

pub mod boundary;
pub mod mesh;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CompileError, UnreachableSliceError};
use crate::events::{CompileEvent, CompileObserver, UnroutedPortWarning};
use crate::model::SwitchRole;
use crate::policy::{ResolvedBoundaryRule, SlicePolicy};
use crate::topology::Topology;

pub use rules::{
    Action, FlowRule, MatchPredicate, Packet, RuleOrigin, RuleSet, RuleTable, PRIORITY_BASE,
    PRIORITY_RETURN_PATH, PRIORITY_UNROUTED,
};

/// What to install on a port no rule covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnroutedPortPolicy {
    /// Report the port, install nothing
    #[default]
    Warn,
    /// Report the port and install an explicit drop rule
    Drop,
    /// Report the port and install a NORMAL rule
    Normal,
}

impl fmt::Display for UnroutedPortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnroutedPortPolicy::Warn => write!(f, "warn"),
            UnroutedPortPolicy::Drop => write!(f, "drop"),
            UnroutedPortPolicy::Normal => write!(f, "normal"),
        }
    }
}

impl FromStr for UnroutedPortPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warn" => Ok(UnroutedPortPolicy::Warn),
            "drop" => Ok(UnroutedPortPolicy::Drop),
            "normal" => Ok(UnroutedPortPolicy::Normal),
            other => Err(format!(
                "Unknown unrouted port mode '{}', expected warn, drop or normal",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Treat a slice without access switches as an error
    pub strict: bool,
    pub unrouted_ports: UnroutedPortPolicy,
}

/// Output of a successful compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compilation {
    pub rules: RuleSet,
    pub warnings: Vec<UnroutedPortWarning>,
}

/// Compile flow tables for every switch of `topology`.
///
/// Events are delivered to `observer` only once the whole rule set has been
/// produced, so a failed compilation reports nothing but its error.
pub fn compile(
    topology: &Topology,
    policy: &SlicePolicy,
    options: &CompileOptions,
    observer: &dyn CompileObserver,
) -> Result<Compilation, CompileError> {
    let mut events = Vec::new();

    // Slices with no access switch have nowhere to mesh
    for slice in topology.slices.values().filter(|s| s.switches.is_empty()) {
        if options.strict {
            return Err(UnreachableSliceError { slice: slice.id.clone() }.into());
        }
        events.push(CompileEvent::SliceUnreachable { slice: slice.id.clone() });
    }

    let mut tables = BTreeMap::new();
    let mut warnings = Vec::new();
    for switch in topology.switches.values() {
        let (mut flows, unrouted) = match &switch.role {
            SwitchRole::Access { slice } => mesh::compile_access(topology, switch, slice),
            SwitchRole::Boundary => {
                let placed: Vec<&ResolvedBoundaryRule> = policy.rules_at(&switch.id).collect();
                boundary::compile_boundary(switch, &placed)?
            }
        };

        // Ports no rule covers get the configured fallback
        for number in unrouted {
            let peer = switch
                .port(number)
                .map(|p| p.peer.node.clone())
                .unwrap_or_default();
            let warning = UnroutedPortWarning {
                switch: switch.id.clone(),
                port: number,
                peer,
                fallback: options.unrouted_ports,
            };
            if let Some(action) = fallback_action(options.unrouted_ports) {
                flows.push(FlowRule {
                    priority: PRIORITY_UNROUTED,
                    predicate: MatchPredicate::in_port(number),
                    action,
                    origin: RuleOrigin::Unrouted,
                });
            }
            events.push(CompileEvent::UnroutedPort(warning.clone()));
            warnings.push(warning);
        }

        let table = RuleTable::new(switch.id.clone(), flows);
        events.push(CompileEvent::TableCompiled {
            switch: switch.id.clone(),
            rules: table.len(),
        });
        tables.insert(switch.id.clone(), table);
    }

    let rules = RuleSet { tables };
    events.push(CompileEvent::CompilationFinished {
        switches: rules.tables.len(),
        rules: rules.rule_count(),
        warnings: warnings.len(),
    });
    // Nothing was reported until here, so a failed compile stays silent
    for event in &events {
        observer.notify(event);
    }

    Ok(Compilation { rules, warnings })
}

fn fallback_action(policy: UnroutedPortPolicy) -> Option<Action> {
    match policy {
        UnroutedPortPolicy::Warn => None,
        UnroutedPortPolicy::Drop => Some(Action::Drop),
        UnroutedPortPolicy::Normal => Some(Action::Normal),
    }
}
