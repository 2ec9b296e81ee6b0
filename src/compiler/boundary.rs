//! Boundary switch rules.
//!
//! Each ingress port gets its own ordered run of rules. Within a run a rule
//! that filters on protocol or priority tag always sits above a rule that
//! does not, so a general rule never shadows a specific one regardless of
//! the priorities the rules were declared with. Among rules of equal
//! specificity the higher declared priority wins, then declaration order.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::StructuralError;
use crate::model::Switch;
use crate::policy::ResolvedBoundaryRule;

use super::rules::{Action, FlowRule, MatchPredicate, RuleOrigin, PRIORITY_BASE, PRIORITY_RETURN_PATH};

/// Rules of one boundary switch, plus the ports left without a rule
pub fn compile_boundary(
    switch: &Switch,
    rules: &[&ResolvedBoundaryRule],
) -> Result<(Vec<FlowRule>, Vec<u16>), StructuralError> {
    let mut by_ingress: BTreeMap<u16, Vec<&ResolvedBoundaryRule>> = BTreeMap::new();
    for rule in rules {
        for port in &rule.ingress {
            by_ingress.entry(*port).or_default().push(*rule);
        }
    }

    let mut flows = Vec::new();
    for (&port, run) in by_ingress.iter_mut() {
        run.sort_by(|x, y| {
            y.specificity()
                .cmp(&x.specificity())
                .then(y.priority.cmp(&x.priority))
                .then(x.index.cmp(&y.index))
        });

        let len = run.len() as u32;
        for (position, rule) in run.iter().enumerate() {
            let egress: Vec<u16> = rule.egress.iter().copied().filter(|&p| p != port).collect();
            if egress.is_empty() {
                return Err(StructuralError::EgressLoop {
                    rule: rule.index,
                    switch: switch.id.clone(),
                    port,
                });
            }
            flows.push(FlowRule {
                priority: PRIORITY_BASE + (len - position as u32),
                predicate: MatchPredicate {
                    in_port: port,
                    protocol: rule.protocol,
                    priority_tag: rule.priority_tag,
                },
                action: Action::output(egress),
                origin: RuleOrigin::Boundary {
                    rule: rule.index,
                    slice: rule.slice.clone(),
                    declared_priority: rule.priority,
                },
            });
        }
    }

    let egress: BTreeSet<u16> = rules.iter().flat_map(|r| r.egress.iter().copied()).collect();
    for &port in egress.iter().filter(|p| !by_ingress.contains_key(*p)) {
        flows.push(FlowRule {
            priority: PRIORITY_RETURN_PATH,
            predicate: MatchPredicate::in_port(port),
            action: Action::Normal,
            origin: RuleOrigin::ReturnPath,
        });
    }

    let unrouted = switch
        .port_numbers()
        .filter(|p| !by_ingress.contains_key(p) && !egress.contains(p))
        .collect();

    Ok((flows, unrouted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::rules::{Packet, RuleTable};
    use crate::model::{Endpoint, NodeKind, Port, Protocol, SwitchRole};

    fn boundary_switch(ports: &[u16]) -> Switch {
        Switch {
            id: "s9".to_string(),
            role: SwitchRole::Boundary,
            ports: ports
                .iter()
                .enumerate()
                .map(|(link, &number)| Port {
                    number,
                    link,
                    peer: Endpoint {
                        node: format!("n{}", number),
                        kind: NodeKind::Host,
                        port: 1,
                    },
                })
                .collect(),
        }
    }

    fn resolved(index: usize, priority: u32, ingress: &[u16], egress: &[u16]) -> ResolvedBoundaryRule {
        ResolvedBoundaryRule {
            index,
            switch: "s9".to_string(),
            slice: "red".to_string(),
            priority,
            protocol: None,
            priority_tag: None,
            ingress: ingress.iter().copied().collect(),
            egress: egress.iter().copied().collect(),
        }
    }

    #[test]
    fn test_specific_rule_precedes_general() {
        let switch = boundary_switch(&[1, 2, 5, 6]);
        let general = resolved(0, 10, &[1, 2], &[5, 6]);
        let mut udp = resolved(1, 5, &[1, 2], &[5]);
        udp.protocol = Some(Protocol::Udp);

        let (flows, unrouted) = compile_boundary(&switch, &[&general, &udp]).unwrap();
        assert!(unrouted.is_empty());

        let port1: Vec<&FlowRule> = flows.iter().filter(|f| f.predicate.in_port == 1).collect();
        assert_eq!(port1.len(), 2);
        assert_eq!(port1[0].predicate.protocol, Some(Protocol::Udp));
        assert_eq!(port1[0].action, Action::Output(vec![5]));
        assert_eq!(port1[1].action, Action::Output(vec![5, 6]));
        assert!(port1[0].priority > port1[1].priority);
        assert!(port1[1].priority > PRIORITY_RETURN_PATH);

        let returns: Vec<u16> = flows
            .iter()
            .filter(|f| f.origin == RuleOrigin::ReturnPath)
            .map(|f| f.predicate.in_port)
            .collect();
        assert_eq!(returns, vec![5, 6]);
    }

    #[test]
    fn test_mixed_filters_ordered_by_specificity() {
        let switch = boundary_switch(&[1, 5, 6, 7]);
        let general = resolved(0, 20, &[1], &[5, 6, 7]);
        let mut tagged = resolved(1, 2, &[1], &[5]);
        tagged.priority_tag = Some(5);
        let mut udp = resolved(2, 9, &[1], &[6]);
        udp.protocol = Some(Protocol::Udp);
        let mut udp_tagged = resolved(3, 1, &[1], &[7]);
        udp_tagged.protocol = Some(Protocol::Udp);
        udp_tagged.priority_tag = Some(5);

        let (flows, _) = compile_boundary(&switch, &[&general, &tagged, &udp, &udp_tagged]).unwrap();
        let order: Vec<(usize, u32)> = flows
            .iter()
            .filter_map(|f| match &f.origin {
                RuleOrigin::Boundary { rule, .. } => Some((*rule, f.priority)),
                _ => None,
            })
            .collect();
        // protocol + tag, then protocol-only and tag-only by declared priority, then general
        assert_eq!(
            order,
            vec![
                (3, PRIORITY_BASE + 4),
                (2, PRIORITY_BASE + 3),
                (1, PRIORITY_BASE + 2),
                (0, PRIORITY_BASE + 1),
            ]
        );

        let table = RuleTable::new("s9", flows);
        let hit = |packet: Packet| table.lookup(&packet).map(|r| r.action.clone());
        assert_eq!(
            hit(Packet::on_port(1).with_protocol(Protocol::Udp).with_priority_tag(5)),
            Some(Action::Output(vec![7]))
        );
        assert_eq!(hit(Packet::on_port(1).with_protocol(Protocol::Udp)), Some(Action::Output(vec![6])));
        assert_eq!(
            hit(Packet::on_port(1).with_protocol(Protocol::Tcp).with_priority_tag(5)),
            Some(Action::Output(vec![5]))
        );
        assert_eq!(
            hit(Packet::on_port(1).with_protocol(Protocol::Tcp)),
            Some(Action::Output(vec![5, 6, 7]))
        );
    }

    #[test]
    fn test_equal_specificity_ordered_by_declared_priority() {
        let switch = boundary_switch(&[1, 5, 6]);
        let low = resolved(0, 3, &[1], &[5]);
        let high = resolved(1, 8, &[1], &[6]);

        let (flows, _) = compile_boundary(&switch, &[&low, &high]).unwrap();
        let port1: Vec<&FlowRule> = flows.iter().filter(|f| f.predicate.in_port == 1).collect();
        assert_eq!(port1[0].action, Action::Output(vec![6]));
        assert_eq!(port1[0].priority, PRIORITY_BASE + 2);
        assert_eq!(port1[1].priority, PRIORITY_BASE + 1);
    }

    #[test]
    fn test_ingress_removed_from_egress() {
        let switch = boundary_switch(&[1, 2]);
        let rule = resolved(0, 1, &[1, 2], &[1, 2]);
        let (flows, _) = compile_boundary(&switch, &[&rule]).unwrap();
        assert_eq!(flows[0].action, Action::Output(vec![2]));
        assert_eq!(flows[1].action, Action::Output(vec![1]));
        assert_eq!(flows.len(), 2);
    }

    #[test]
    fn test_egress_loop_rejected() {
        let switch = boundary_switch(&[1, 2]);
        let rule = resolved(4, 1, &[1], &[1]);
        let err = compile_boundary(&switch, &[&rule]).unwrap_err();
        assert_eq!(
            err,
            StructuralError::EgressLoop {
                rule: 4,
                switch: "s9".to_string(),
                port: 1,
            }
        );
    }

    #[test]
    fn test_uncovered_ports_reported() {
        let switch = boundary_switch(&[1, 2, 3]);
        let rule = resolved(0, 1, &[1], &[2]);
        let (_, unrouted) = compile_boundary(&switch, &[&rule]).unwrap();
        assert_eq!(unrouted, vec![3]);

        let (flows, unrouted) = compile_boundary(&switch, &[]).unwrap();
        assert!(flows.is_empty());
        assert_eq!(unrouted, vec![1, 2, 3]);
    }
}
