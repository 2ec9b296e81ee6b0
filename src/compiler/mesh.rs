//! Intra-slice rules for access switches.

use crate::model::{IsolationPolicy, Port, Switch};
use crate::topology::Topology;

use super::rules::{Action, FlowRule, MatchPredicate, RuleOrigin, PRIORITY_BASE};

/// Rules of one access switch, plus the ports left without a rule.
///
/// Under full-mesh isolation every slice port forwards to all other slice
/// ports of the switch. A port with nowhere to forward to gets no rule.
pub fn compile_access(topology: &Topology, switch: &Switch, slice: &str) -> (Vec<FlowRule>, Vec<u16>) {
    let isolation = topology
        .slice(slice)
        .map(|s| s.isolation)
        .unwrap_or_default();

    let (members, outsiders): (Vec<&Port>, Vec<&Port>) = switch
        .ports
        .iter()
        .partition(|p| topology.port_slice(switch, p) == Some(slice));
    let members: Vec<u16> = members.iter().map(|p| p.number).collect();
    let mut unrouted: Vec<u16> = outsiders.iter().map(|p| p.number).collect();

    let mut rules = Vec::with_capacity(members.len());
    for &port in &members {
        let (action, origin) = match isolation {
            IsolationPolicy::FullMesh => {
                let others: Vec<u16> = members.iter().copied().filter(|&p| p != port).collect();
                if others.is_empty() {
                    unrouted.push(port);
                    continue;
                }
                (Action::output(others), RuleOrigin::Mesh { slice: slice.to_string() })
            }
            IsolationPolicy::None => (Action::Normal, RuleOrigin::SliceNormal { slice: slice.to_string() }),
        };
        rules.push(FlowRule {
            priority: PRIORITY_BASE,
            predicate: MatchPredicate::in_port(port),
            action,
            origin,
        });
    }

    unrouted.sort_unstable();
    (rules, unrouted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndpointSpec, HostAddress, HostSpec, LinkSpec, Slice, SwitchSpec};
    use crate::topology::build;
    use std::net::Ipv4Addr;

    fn access_topology(isolation: IsolationPolicy, hosts: usize) -> Topology {
        let host_specs = (1..=hosts)
            .map(|i| HostSpec {
                id: format!("h{}", i),
                address: HostAddress::new(Ipv4Addr::new(10, 0, 0, i as u8), 8),
            })
            .collect::<Vec<_>>();
        let switches = vec![
            SwitchSpec { id: "s1".to_string(), controllers: None },
            SwitchSpec { id: "s9".to_string(), controllers: None },
        ];
        let mut links: Vec<LinkSpec> = host_specs
            .iter()
            .map(|h| LinkSpec::new(EndpointSpec::new(h.id.clone()), EndpointSpec::new("s1")))
            .collect();
        links.push(LinkSpec::new(EndpointSpec::new("s1"), EndpointSpec::new("s9")));
        let slice = Slice::new("red", isolation)
            .with_hosts(host_specs.iter().map(|h| h.id.clone()))
            .with_switches(["s1"]);
        build(host_specs, switches, links, vec![slice]).unwrap()
    }

    #[test]
    fn test_full_mesh_outputs_other_ports() {
        let topology = access_topology(IsolationPolicy::FullMesh, 2);
        let switch = topology.switch("s1").unwrap();
        let (rules, unrouted) = compile_access(&topology, switch, "red");

        assert!(unrouted.is_empty());
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].predicate, MatchPredicate::in_port(1));
        assert_eq!(rules[0].action, Action::Output(vec![2, 3]));
        assert_eq!(rules[2].predicate, MatchPredicate::in_port(3));
        assert_eq!(rules[2].action, Action::Output(vec![1, 2]));
        assert!(rules.iter().all(|r| r.priority == PRIORITY_BASE));
    }

    #[test]
    fn test_no_isolation_uses_normal() {
        let topology = access_topology(IsolationPolicy::None, 2);
        let switch = topology.switch("s1").unwrap();
        let (rules, _) = compile_access(&topology, switch, "red");

        assert_eq!(rules.len(), 3);
        assert!(rules.iter().all(|r| r.action == Action::Normal));
        assert_eq!(rules[0].origin, RuleOrigin::SliceNormal { slice: "red".to_string() });
    }

    #[test]
    fn test_lonely_port_is_unrouted() {
        let topology = access_topology(IsolationPolicy::FullMesh, 0);
        let switch = topology.switch("s1").unwrap();
        let (rules, unrouted) = compile_access(&topology, switch, "red");

        assert!(rules.is_empty());
        assert_eq!(unrouted, vec![1]);
    }
}
