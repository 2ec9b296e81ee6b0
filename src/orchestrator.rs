//! Provisioning orchestrator.
//!
//! Coordinates the whole flow from a parsed declaration to the artifacts on
//! disk. [`plan`] is pure; [`generate_artifacts`] is the only place in the
//! library that touches the filesystem.

use color_eyre::eyre::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::compiler::{compile, Compilation, CompileOptions};
use crate::config::NetworkConfig;
use crate::controller;
use crate::error::CompileError;
use crate::events::CompileObserver;
use crate::export::{generate_dot, render_script, write_json, write_text};
use crate::model::{ControllerGroup, Declaration};
use crate::policy::SlicePolicy;
use crate::topology::{self, Topology};

/// File names written into the output directory
pub const RULES_FILE: &str = "rules.json";
pub const FLOWS_FILE: &str = "flows.sh";
pub const TOPOLOGY_FILE: &str = "topology.json";
pub const DIAGRAM_FILE: &str = "topology.dot";
pub const CONTROLLERS_FILE: &str = "controllers.json";

/// Everything needed to provision a network
#[derive(Debug, Clone)]
pub struct ProvisioningPlan {
    pub topology: Topology,
    pub policy: SlicePolicy,
    pub compilation: Compilation,
    pub controllers: BTreeMap<String, ControllerGroup>,
}

/// Validate a declaration and compile it into a provisioning plan
pub fn plan(
    declaration: &Declaration,
    options: &CompileOptions,
    observer: &dyn CompileObserver,
) -> Result<ProvisioningPlan, CompileError> {
    let topology = topology::build(
        declaration.hosts.clone(),
        declaration.switches.clone(),
        declaration.links.clone(),
        declaration.slices.clone(),
    )?;
    let controllers = controller::assign(&declaration.switches, &declaration.controllers)?;
    let policy = SlicePolicy::resolve(&topology, &declaration.boundary_rules)?;
    let compilation = compile(&topology, &policy, options, observer)?;

    Ok(ProvisioningPlan {
        topology,
        policy,
        compilation,
        controllers,
    })
}

/// Compile `config` and write every artifact into `output_dir`
pub fn generate_artifacts(
    config: &NetworkConfig,
    options: &CompileOptions,
    output_dir: &Path,
    observer: &dyn CompileObserver,
) -> Result<ProvisioningPlan> {
    // Names reach the flow script verbatim, so check them even for documents
    // that did not come through the loader
    config.validate()?;
    let declaration = config.to_declaration()?;
    let plan = plan(&declaration, options, observer)
        .with_context(|| format!("Failed to compile network '{}'", config.general.name))?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    write_json(&plan.compilation, &output_dir.join(RULES_FILE))?;
    write_json(&plan.topology, &output_dir.join(TOPOLOGY_FILE))?;
    write_json(&plan.controllers, &output_dir.join(CONTROLLERS_FILE))?;

    let script = render_script(&config.general.name, &plan.compilation.rules, &plan.controllers);
    write_text(&script, &output_dir.join(FLOWS_FILE))?;

    let dot = generate_dot(&plan.topology, &config.general.name, config.general.diagram_direction);
    write_text(&dot, &output_dir.join(DIAGRAM_FILE))?;

    info!(
        "Network '{}': {} switches, {} hosts, {} rules",
        config.general.name,
        plan.topology.switches.len(),
        plan.topology.hosts.len(),
        plan.compilation.rules.rule_count()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullObserver;
    use tempfile::TempDir;

    const LAB: &str = r#"
general:
  name: lab
controllers:
  - { name: c0, ip: 127.0.0.1 }
switches:
  - name: s1
hosts:
  - { name: h1 }
  - { name: h2 }
links:
  - { from: h1, to: s1 }
  - { from: h2, to: s1 }
slices:
  - { name: red, hosts: [h1, h2], switches: [s1] }
"#;

    #[test]
    fn test_generate_artifacts() {
        let config: NetworkConfig = serde_yaml::from_str(LAB).unwrap();
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");

        let plan = generate_artifacts(&config, &config.compile_options(), &output, &NullObserver).unwrap();
        assert_eq!(plan.compilation.rules.rule_count(), 2);

        for file in [RULES_FILE, FLOWS_FILE, TOPOLOGY_FILE, DIAGRAM_FILE, CONTROLLERS_FILE] {
            assert!(output.join(file).exists(), "missing {}", file);
        }
        let flows = fs::read_to_string(output.join(FLOWS_FILE)).unwrap();
        assert!(flows.contains("ovs-vsctl set-controller s1 tcp:127.0.0.1:6633"));
        assert!(flows.contains("ovs-ofctl add-flow s1 'priority=100,in_port=1,actions=output:2'"));
    }

    #[test]
    fn test_unsafe_switch_name_writes_nothing() {
        let yaml = LAB.replace("s1", "s1; touch /tmp/owned");
        let config: NetworkConfig = serde_yaml::from_str(&yaml).unwrap();
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");

        let err = generate_artifacts(&config, &config.compile_options(), &output, &NullObserver).unwrap_err();
        assert!(err.to_string().contains("Invalid switch configuration"));
        assert!(!output.exists());
    }

    #[test]
    fn test_plan_fails_without_controllers() {
        let mut config: NetworkConfig = serde_yaml::from_str(LAB).unwrap();
        config.controllers.clear();
        let declaration = config.to_declaration().unwrap();
        let err = plan(&declaration, &CompileOptions::default(), &NullObserver).unwrap_err();
        assert!(err.is_structural());
    }
}
