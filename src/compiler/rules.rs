//! Flow-rule records.
//!
//! Rules are plain data with a total order. Turning them into switch
//! command text happens in `export::ovs`, never here.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::Protocol;

/// Priority of fallback rules for ports nothing else routes
pub const PRIORITY_UNROUTED: u32 = 0;
/// Priority of the NORMAL rules on boundary egress-only ports
pub const PRIORITY_RETURN_PATH: u32 = 1;
/// Lowest priority given to slice and boundary rules
pub const PRIORITY_BASE: u32 = 100;

/// Condition a packet must satisfy for a rule to apply
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MatchPredicate {
    pub in_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_tag: Option<u8>,
}

impl MatchPredicate {
    pub fn in_port(port: u16) -> Self {
        Self {
            in_port: port,
            protocol: None,
            priority_tag: None,
        }
    }

    /// Number of fields constrained beyond the ingress port
    pub fn specificity(&self) -> u8 {
        u8::from(self.protocol.is_some()) + u8::from(self.priority_tag.is_some())
    }

    pub fn matches(&self, packet: &Packet) -> bool {
        packet.in_port == self.in_port
            && self.protocol.map_or(true, |p| packet.protocol == Some(p))
            && self.priority_tag.map_or(true, |t| packet.priority_tag == Some(t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", content = "ports", rename_all = "snake_case")]
pub enum Action {
    /// Forward out of the listed ports, ascending
    Output(Vec<u16>),
    /// Hand the packet to the switch's default L2 pipeline
    Normal,
    Drop,
}

impl Action {
    pub fn output<I: IntoIterator<Item = u16>>(ports: I) -> Self {
        let mut ports: Vec<u16> = ports.into_iter().collect();
        ports.sort_unstable();
        ports.dedup();
        Action::Output(ports)
    }
}

/// Why a rule exists
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleOrigin {
    /// Full-mesh forwarding inside a slice
    Mesh { slice: String },
    /// Default switching inside a slice with no isolation
    SliceNormal { slice: String },
    Boundary {
        rule: usize,
        slice: String,
        declared_priority: u32,
    },
    /// Traffic entering a boundary switch on an egress-only port
    ReturnPath,
    /// Fallback for a port no other rule covers
    Unrouted,
}

/// One entry of a switch's flow table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FlowRule {
    pub priority: u32,
    #[serde(rename = "match")]
    pub predicate: MatchPredicate,
    pub action: Action,
    pub origin: RuleOrigin,
}

impl Ord for FlowRule {
    /// Table order: highest priority first, ties by predicate
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.predicate.cmp(&other.predicate))
            .then_with(|| self.action.cmp(&other.action))
            .then_with(|| self.origin.cmp(&other.origin))
    }
}

impl PartialOrd for FlowRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A packet header as seen by the match stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub in_port: u16,
    pub protocol: Option<Protocol>,
    pub priority_tag: Option<u8>,
}

impl Packet {
    pub fn on_port(in_port: u16) -> Self {
        Self {
            in_port,
            protocol: None,
            priority_tag: None,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_priority_tag(mut self, tag: u8) -> Self {
        self.priority_tag = Some(tag);
        self
    }
}

/// Ordered flow table of one switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTable {
    pub switch: String,
    pub rules: Vec<FlowRule>,
}

impl RuleTable {
    pub fn new(switch: impl Into<String>, mut rules: Vec<FlowRule>) -> Self {
        rules.sort();
        Self {
            switch: switch.into(),
            rules,
        }
    }

    /// First rule in table order that matches `packet`
    pub fn lookup(&self, packet: &Packet) -> Option<&FlowRule> {
        self.rules.iter().find(|r| r.predicate.matches(packet))
    }

    pub fn rules_for_port(&self, port: u16) -> impl Iterator<Item = &FlowRule> + '_ {
        self.rules.iter().filter(move |r| r.predicate.in_port == port)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Flow tables for every switch, keyed by switch id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub tables: BTreeMap<String, RuleTable>,
}

impl RuleSet {
    pub fn table(&self, switch: &str) -> Option<&RuleTable> {
        self.tables.get(switch)
    }

    pub fn rule_count(&self) -> usize {
        self.tables.values().map(RuleTable::len).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(priority: u32, predicate: MatchPredicate, action: Action) -> FlowRule {
        FlowRule {
            priority,
            predicate,
            action,
            origin: RuleOrigin::ReturnPath,
        }
    }

    #[test]
    fn test_table_is_sorted_by_priority() {
        let table = RuleTable::new(
            "s9",
            vec![
                rule(101, MatchPredicate::in_port(1), Action::output([6, 5])),
                rule(1, MatchPredicate::in_port(5), Action::Normal),
                rule(102, MatchPredicate { protocol: Some(Protocol::Udp), ..MatchPredicate::in_port(1) }, Action::output([5])),
            ],
        );
        let priorities: Vec<u32> = table.rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![102, 101, 1]);
        assert_eq!(table.rules[1].action, Action::Output(vec![5, 6]));
        assert_eq!(table.rules_for_port(1).count(), 2);
    }

    #[test]
    fn test_lookup_picks_first_match() {
        let udp = MatchPredicate { protocol: Some(Protocol::Udp), ..MatchPredicate::in_port(1) };
        let table = RuleTable::new(
            "s9",
            vec![
                rule(101, MatchPredicate::in_port(1), Action::output([5, 6])),
                rule(102, udp, Action::output([5])),
            ],
        );

        let hit = table.lookup(&Packet::on_port(1).with_protocol(Protocol::Udp)).unwrap();
        assert_eq!(hit.action, Action::Output(vec![5]));
        let hit = table.lookup(&Packet::on_port(1).with_protocol(Protocol::Tcp)).unwrap();
        assert_eq!(hit.action, Action::Output(vec![5, 6]));
        assert!(table.lookup(&Packet::on_port(2)).is_none());
    }

    #[test]
    fn test_priority_tag_match() {
        let tagged = MatchPredicate { priority_tag: Some(5), ..MatchPredicate::in_port(3) };
        assert_eq!(tagged.specificity(), 1);
        assert!(tagged.matches(&Packet::on_port(3).with_priority_tag(5)));
        assert!(!tagged.matches(&Packet::on_port(3)));
        assert!(!tagged.matches(&Packet::on_port(3).with_priority_tag(1)));
    }

    #[test]
    fn test_rule_json_shape() {
        let rule = rule(1, MatchPredicate::in_port(5), Action::output([2]));
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["match"]["in_port"], 5);
        assert!(json["match"].get("protocol").is_none());
        assert_eq!(json["action"]["type"], "output");
        assert_eq!(json["action"]["ports"][0], 2);
        assert_eq!(json["origin"]["kind"], "return_path");
    }
}
