//! Output adapters.
//!
//! Everything that turns compiled values into text lives here: the
//! `ovs-ofctl` flow script, the Graphviz diagram and the JSON documents.

pub mod dot;
pub mod ovs;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub use dot::{generate_dot, DiagramDirection};
pub use ovs::{render_flow, render_script};

/// Serialize `value` as pretty JSON and write it to `output_path`
pub fn write_json<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", output_path.display()))?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    log::info!("Wrote {}", output_path.display());
    Ok(())
}

/// Write a text artifact
pub fn write_text(text: &str, output_path: &Path) -> Result<()> {
    fs::write(output_path, text).with_context(|| format!("Failed to write {}", output_path.display()))?;
    log::info!("Wrote {}", output_path.display());
    Ok(())
}
