//! Deterministic port numbering.
//!
//! Explicitly numbered endpoints are reserved first. Every remaining
//! endpoint then takes the lowest free number on its node (starting at 1),
//! visiting links in declaration order, `a` side before `b` side. The same
//! declaration therefore always yields the same numbering.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::StructuralError;
use crate::model::{EndpointSpec, LinkSpec};

/// Assign a port number to both endpoints of every link
///
/// # Returns
/// One `(a_port, b_port)` pair per link, in link order.
pub fn assign_ports(links: &[LinkSpec]) -> Result<Vec<(u16, u16)>, StructuralError> {
    let mut used: BTreeMap<String, BTreeSet<u16>> = BTreeMap::new();

    for link in links {
        for end in [&link.a, &link.b] {
            if let Some(port) = end.port {
                if port == 0 {
                    return Err(StructuralError::InvalidPort { node: end.node.clone() });
                }
                if !used.entry(end.node.clone()).or_default().insert(port) {
                    return Err(StructuralError::DuplicatePort {
                        node: end.node.clone(),
                        port,
                    });
                }
            }
        }
    }

    let mut assigned = Vec::with_capacity(links.len());
    for link in links {
        let a = resolve_port(&mut used, &link.a)?;
        let b = resolve_port(&mut used, &link.b)?;
        assigned.push((a, b));
    }
    Ok(assigned)
}

fn resolve_port(
    used: &mut BTreeMap<String, BTreeSet<u16>>,
    end: &EndpointSpec,
) -> Result<u16, StructuralError> {
    if let Some(port) = end.port {
        return Ok(port);
    }
    let taken = used.entry(end.node.clone()).or_default();
    let free = (1..=u16::MAX)
        .find(|p| !taken.contains(p))
        .ok_or_else(|| StructuralError::PortsExhausted { node: end.node.clone() })?;
    taken.insert(free);
    Ok(free)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(a: EndpointSpec, b: EndpointSpec) -> LinkSpec {
        LinkSpec::new(a, b)
    }

    #[test]
    fn test_ports_follow_declaration_order() {
        let links = vec![
            link(EndpointSpec::new("h1"), EndpointSpec::new("s1")),
            link(EndpointSpec::new("h2"), EndpointSpec::new("s1")),
            link(EndpointSpec::new("s1"), EndpointSpec::new("s9")),
        ];
        let ports = assign_ports(&links).unwrap();
        assert_eq!(ports, vec![(1, 1), (1, 2), (3, 1)]);
    }

    #[test]
    fn test_explicit_ports_are_reserved_first() {
        // s9 port 1 is claimed by the second link, so the first auto port is 2
        let links = vec![
            link(EndpointSpec::new("s1"), EndpointSpec::new("s9")),
            link(EndpointSpec::new("s2"), EndpointSpec::with_port("s9", 1)),
            link(EndpointSpec::new("s9"), EndpointSpec::new("srv1")),
        ];
        let ports = assign_ports(&links).unwrap();
        assert_eq!(ports, vec![(1, 2), (1, 1), (3, 1)]);
    }

    #[test]
    fn test_duplicate_explicit_port() {
        let links = vec![
            link(EndpointSpec::new("h1"), EndpointSpec::with_port("s1", 3)),
            link(EndpointSpec::new("h2"), EndpointSpec::with_port("s1", 3)),
        ];
        assert_eq!(
            assign_ports(&links),
            Err(StructuralError::DuplicatePort { node: "s1".to_string(), port: 3 })
        );
    }

    #[test]
    fn test_port_zero_rejected() {
        let links = vec![link(EndpointSpec::with_port("h1", 0), EndpointSpec::new("s1"))];
        assert!(matches!(assign_ports(&links), Err(StructuralError::InvalidPort { .. })));
    }

    #[test]
    fn test_assignment_is_reproducible() {
        let links = vec![
            link(EndpointSpec::new("h1"), EndpointSpec::with_port("s1", 2)),
            link(EndpointSpec::new("h2"), EndpointSpec::new("s1")),
            link(EndpointSpec::new("h3"), EndpointSpec::new("s1")),
        ];
        assert_eq!(assign_ports(&links).unwrap(), assign_ports(&links).unwrap());
        assert_eq!(assign_ports(&links).unwrap(), vec![(1, 2), (1, 1), (1, 3)]);
    }
}
