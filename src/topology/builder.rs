//! Topology builder.
//!
//! Turns a fully specified declaration into an immutable [`Topology`].
//! Every structural invariant the compiler relies on is checked here, and
//! any violation aborts the build: there is no partially built topology.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use crate::error::StructuralError;
use crate::model::{
    Endpoint, Host, HostSpec, Link, LinkSpec, NodeKind, Port, Slice, Switch, SwitchRole,
    SwitchSpec,
};

use super::ports::assign_ports;
use super::types::Topology;

/// Build and validate a topology
///
/// # Arguments
/// * `hosts` - Declared hosts, each with a concrete address
/// * `switches` - Declared switches
/// * `links` - Declared links, in declaration order (drives port numbering)
/// * `slices` - Slice membership and isolation policy
///
/// # Returns
/// * `Ok(Topology)` if every invariant holds
/// * `Err(StructuralError)` naming the first offending entity otherwise
pub fn build(
    hosts: Vec<HostSpec>,
    switches: Vec<SwitchSpec>,
    links: Vec<LinkSpec>,
    slices: Vec<Slice>,
) -> Result<Topology, StructuralError> {
    let kinds = register_nodes(&hosts, &switches)?;
    check_addresses(&hosts)?;
    let membership = resolve_membership(&hosts, &slices, &kinds)?;
    check_links(&links, &kinds)?;

    let ports = assign_ports(&links)?;
    let resolved: Vec<Link> = links
        .into_iter()
        .zip(ports)
        .enumerate()
        .map(|(index, (spec, (a_port, b_port)))| Link {
            index,
            a: Endpoint { kind: kinds[&spec.a.node], node: spec.a.node, port: a_port },
            b: Endpoint { kind: kinds[&spec.b.node], node: spec.b.node, port: b_port },
            bandwidth: spec.bandwidth.or(spec.reverse_bandwidth),
            qos_class: spec.qos_class,
        })
        .collect();

    check_slice_crossings(&resolved, &membership)?;

    let mut node_ports: BTreeMap<String, Vec<Port>> = BTreeMap::new();
    for link in &resolved {
        node_ports.entry(link.a.node.clone()).or_default().push(Port {
            number: link.a.port,
            link: link.index,
            peer: link.b.clone(),
        });
        node_ports.entry(link.b.node.clone()).or_default().push(Port {
            number: link.b.port,
            link: link.index,
            peer: link.a.clone(),
        });
    }
    for ports in node_ports.values_mut() {
        ports.sort_by_key(|p| p.number);
    }

    let mut host_map = BTreeMap::new();
    for spec in hosts {
        let slice = membership.hosts[&spec.id].clone();
        let ports = node_ports.remove(&spec.id).unwrap_or_default();
        host_map.insert(
            spec.id.clone(),
            Host {
                id: spec.id,
                address: spec.address,
                slice,
                ports,
            },
        );
    }

    let mut switch_map = BTreeMap::new();
    for spec in switches {
        let role = match membership.switches.get(&spec.id) {
            Some(slice) => SwitchRole::Access { slice: slice.clone() },
            None => SwitchRole::Boundary,
        };
        let ports = node_ports.remove(&spec.id).unwrap_or_default();
        switch_map.insert(spec.id.clone(), Switch { id: spec.id, role, ports });
    }

    let slice_map = slices.into_iter().map(|s| (s.id.clone(), s)).collect();

    Ok(Topology {
        hosts: host_map,
        switches: switch_map,
        links: resolved,
        slices: slice_map,
    })
}

/// Register every node id, rejecting duplicates across hosts and switches
fn register_nodes(
    hosts: &[HostSpec],
    switches: &[SwitchSpec],
) -> Result<BTreeMap<String, NodeKind>, StructuralError> {
    let mut kinds = BTreeMap::new();
    let ids = hosts
        .iter()
        .map(|h| (&h.id, NodeKind::Host))
        .chain(switches.iter().map(|s| (&s.id, NodeKind::Switch)));
    for (id, kind) in ids {
        if kinds.insert(id.clone(), kind).is_some() {
            return Err(StructuralError::DuplicateNode(id.clone()));
        }
    }
    Ok(kinds)
}

fn check_addresses(hosts: &[HostSpec]) -> Result<(), StructuralError> {
    let mut seen: BTreeMap<Ipv4Addr, &str> = BTreeMap::new();
    for host in hosts {
        if let Some(first) = seen.insert(host.address.ip, &host.id) {
            return Err(StructuralError::DuplicateAddress {
                address: host.address.ip.to_string(),
                first: first.to_string(),
                second: host.id.clone(),
            });
        }
    }
    Ok(())
}

/// Owning slice of every host and of every access switch
struct Membership {
    hosts: BTreeMap<String, String>,
    switches: BTreeMap<String, String>,
}

impl Membership {
    fn owner(&self, endpoint: &Endpoint) -> Option<&String> {
        match endpoint.kind {
            NodeKind::Host => self.hosts.get(&endpoint.node),
            NodeKind::Switch => self.switches.get(&endpoint.node),
        }
    }
}

fn resolve_membership(
    hosts: &[HostSpec],
    slices: &[Slice],
    kinds: &BTreeMap<String, NodeKind>,
) -> Result<Membership, StructuralError> {
    let mut slice_ids = BTreeSet::new();
    let mut host_claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut switch_claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for slice in slices {
        if !slice_ids.insert(slice.id.as_str()) {
            return Err(StructuralError::DuplicateSlice(slice.id.clone()));
        }
        for host in &slice.hosts {
            if kinds.get(host) != Some(&NodeKind::Host) {
                return Err(StructuralError::UnknownSliceHost {
                    slice: slice.id.clone(),
                    host: host.clone(),
                });
            }
            let claims = host_claims.entry(host.as_str()).or_default();
            if !claims.contains(&slice.id) {
                claims.push(slice.id.clone());
            }
        }
        for switch in &slice.switches {
            if kinds.get(switch) != Some(&NodeKind::Switch) {
                return Err(StructuralError::UnknownSliceSwitch {
                    slice: slice.id.clone(),
                    switch: switch.clone(),
                });
            }
            let claims = switch_claims.entry(switch.as_str()).or_default();
            if !claims.contains(&slice.id) {
                claims.push(slice.id.clone());
            }
        }
    }

    let mut host_slices = BTreeMap::new();
    for host in hosts {
        match host_claims.get(host.id.as_str()).map(Vec::as_slice) {
            Some([slice]) => {
                host_slices.insert(host.id.clone(), slice.clone());
            }
            claims => {
                return Err(StructuralError::HostSliceCount {
                    host: host.id.clone(),
                    slices: claims.map(<[String]>::to_vec).unwrap_or_default(),
                });
            }
        }
    }

    let mut switch_slices = BTreeMap::new();
    for (switch, claims) in switch_claims {
        if claims.len() > 1 {
            return Err(StructuralError::SharedAccessSwitch {
                switch: switch.to_string(),
                slices: claims,
            });
        }
        if let Some(slice) = claims.into_iter().next() {
            switch_slices.insert(switch.to_string(), slice);
        }
    }

    Ok(Membership {
        hosts: host_slices,
        switches: switch_slices,
    })
}

fn check_links(links: &[LinkSpec], kinds: &BTreeMap<String, NodeKind>) -> Result<(), StructuralError> {
    for (index, link) in links.iter().enumerate() {
        for end in [&link.a, &link.b] {
            if !kinds.contains_key(&end.node) {
                return Err(StructuralError::DanglingEndpoint {
                    link: index,
                    node: end.node.clone(),
                });
            }
        }
        if link.a.node == link.b.node {
            return Err(StructuralError::SelfLoop {
                link: index,
                node: link.a.node.clone(),
            });
        }
        if let (Some(forward), Some(reverse)) = (link.bandwidth, link.reverse_bandwidth) {
            if forward != reverse {
                return Err(StructuralError::BandwidthMismatch {
                    link: index,
                    a: link.a.node.clone(),
                    b: link.b.node.clone(),
                    forward,
                    reverse,
                });
            }
        }
    }
    Ok(())
}

/// Reject links that join two different slices without a boundary switch
fn check_slice_crossings(links: &[Link], membership: &Membership) -> Result<(), StructuralError> {
    for link in links {
        if let (Some(a_slice), Some(b_slice)) = (membership.owner(&link.a), membership.owner(&link.b)) {
            if a_slice != b_slice {
                return Err(StructuralError::CrossSliceLink {
                    link: link.index,
                    a: link.a.node.clone(),
                    a_slice: a_slice.clone(),
                    b: link.b.node.clone(),
                    b_slice: b_slice.clone(),
                });
            }
        }
    }
    Ok(())
}
