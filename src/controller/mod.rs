//! Controller assignment.
//!
//! Every switch gets an ordered fail-over group: the first controller is
//! primary, the rest take over in order. A switch without an explicit list
//! is served by all declared controllers in declaration order.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::StructuralError;
use crate::model::{Controller, ControllerGroup, SwitchSpec};

/// Build the fail-over group of every switch
pub fn assign(
    switches: &[SwitchSpec],
    controllers: &[Controller],
) -> Result<BTreeMap<String, ControllerGroup>, StructuralError> {
    let mut by_id: BTreeMap<&str, &Controller> = BTreeMap::new();
    for controller in controllers {
        if by_id.insert(controller.id.as_str(), controller).is_some() {
            return Err(StructuralError::DuplicateController(controller.id.clone()));
        }
    }

    let mut groups = BTreeMap::new();
    for switch in switches {
        let members = match &switch.controllers {
            None => controllers.to_vec(),
            Some(names) => {
                let mut seen = BTreeSet::new();
                let mut members = Vec::with_capacity(names.len());
                for name in names {
                    if !seen.insert(name.as_str()) {
                        return Err(StructuralError::RepeatedController {
                            switch: switch.id.clone(),
                            controller: name.clone(),
                        });
                    }
                    let controller = by_id.get(name.as_str()).ok_or_else(|| StructuralError::UnknownController {
                        switch: switch.id.clone(),
                        controller: name.clone(),
                    })?;
                    members.push((*controller).clone());
                }
                members
            }
        };

        if members.is_empty() {
            return Err(StructuralError::NoController { switch: switch.id.clone() });
        }
        debug!(
            "Switch '{}' controllers: {}",
            switch.id,
            members.iter().map(|c| c.id.as_str()).collect::<Vec<_>>().join(", ")
        );
        groups.insert(
            switch.id.clone(),
            ControllerGroup {
                switch: switch.id.clone(),
                controllers: members,
            },
        );
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn controllers() -> Vec<Controller> {
        (0..3)
            .map(|i| Controller::new(format!("c{}", i), IpAddr::V4(Ipv4Addr::LOCALHOST), 6633 + i))
            .collect()
    }

    fn switch(id: &str, controllers: Option<&[&str]>) -> SwitchSpec {
        SwitchSpec {
            id: id.to_string(),
            controllers: controllers.map(|names| names.iter().map(|n| n.to_string()).collect()),
        }
    }

    #[test]
    fn test_default_is_all_controllers() {
        let groups = assign(&[switch("s1", None)], &controllers()).unwrap();
        let group = &groups["s1"];
        assert_eq!(group.controllers.len(), 3);
        assert_eq!(group.primary().map(|c| c.port), Some(6633));
    }

    #[test]
    fn test_explicit_order_kept() {
        let groups = assign(&[switch("s1", Some(&["c2", "c0"]))], &controllers()).unwrap();
        let ids: Vec<&str> = groups["s1"].controllers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c0"]);
    }

    #[test]
    fn test_assignment_errors() {
        assert_eq!(
            assign(&[switch("s1", Some(&["c7"]))], &controllers()).unwrap_err(),
            StructuralError::UnknownController {
                switch: "s1".to_string(),
                controller: "c7".to_string(),
            }
        );
        assert_eq!(
            assign(&[switch("s1", Some(&[]))], &controllers()).unwrap_err(),
            StructuralError::NoController { switch: "s1".to_string() }
        );
        assert_eq!(
            assign(&[switch("s1", None)], &[]).unwrap_err(),
            StructuralError::NoController { switch: "s1".to_string() }
        );
        assert!(matches!(
            assign(&[switch("s1", Some(&["c0", "c0"]))], &controllers()),
            Err(StructuralError::RepeatedController { .. })
        ));

        let mut doubled = controllers();
        doubled.push(doubled[0].clone());
        assert_eq!(
            assign(&[], &doubled).unwrap_err(),
            StructuralError::DuplicateController("c0".to_string())
        );
    }
}
