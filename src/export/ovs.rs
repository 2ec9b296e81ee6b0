//! Open vSwitch command rendering.

use std::collections::BTreeMap;

use crate::compiler::{Action, FlowRule, RuleSet};
use crate::model::ControllerGroup;

/// Render one rule in `ovs-ofctl add-flow` syntax
pub fn render_flow(rule: &FlowRule) -> String {
    let mut fields = vec![
        format!("priority={}", rule.priority),
        format!("in_port={}", rule.predicate.in_port),
    ];
    if let Some(protocol) = rule.predicate.protocol {
        fields.push(protocol.to_string());
    }
    if let Some(tag) = rule.predicate.priority_tag {
        fields.push(format!("dl_vlan_pcp={}", tag));
    }

    let actions = match &rule.action {
        Action::Output(ports) => ports
            .iter()
            .map(|p| format!("output:{}", p))
            .collect::<Vec<_>>()
            .join(","),
        Action::Normal => "NORMAL".to_string(),
        Action::Drop => "drop".to_string(),
    };
    fields.push(format!("actions={}", actions));
    fields.join(",")
}

/// Render the provisioning script for a compiled network.
///
/// Per switch: point it at its controllers, clear its table, then add every
/// rule in table order.
pub fn render_script(name: &str, rules: &RuleSet, controllers: &BTreeMap<String, ControllerGroup>) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    script.push_str(&format!("# Flow tables for network '{}'\n", name));
    script.push_str("set -e\n");

    for (switch, table) in &rules.tables {
        script.push('\n');
        if let Some(group) = controllers.get(switch) {
            let targets: Vec<String> = group.controllers.iter().map(|c| c.target()).collect();
            script.push_str(&format!("ovs-vsctl set-controller {} {}\n", switch, targets.join(" ")));
        }
        script.push_str(&format!("ovs-ofctl del-flows {}\n", switch));
        for rule in &table.rules {
            script.push_str(&format!("ovs-ofctl add-flow {} '{}'\n", switch, render_flow(rule)));
        }
    }
    script
}
