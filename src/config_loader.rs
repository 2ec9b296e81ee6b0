//! Reading network declarations from disk.

use crate::config::NetworkConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse a network declaration from a YAML file
pub fn load_config(config_path: &Path) -> Result<NetworkConfig> {
    info!("Loading configuration from: {:?}", config_path);

    // Open the configuration file
    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    // Parse the YAML content
    let config: NetworkConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    // Validate names, addresses and bandwidths
    config.validate()?;

    info!(
        "Loaded network '{}': {} hosts, {} switches, {} links, {} slices, {} boundary rules",
        config.general.name,
        config.hosts.len(),
        config.switches.len(),
        config.links.len(),
        config.slices.len(),
        config.boundary_rules.len()
    );
    Ok(config)
}
