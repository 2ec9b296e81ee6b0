//! Graphviz diagram of a topology.
//!
//! Each slice becomes a cluster holding its hosts and access switches.
//! Boundary switches sit outside every cluster. Link labels carry bandwidth
//! and QoS class, and the tail/head labels show the port numbers.

use serde::{Deserialize, Serialize};

use crate::model::{IsolationPolicy, Link, NodeKind};
use crate::topology::Topology;

/// Fill colours handed to slice clusters in order
const SLICE_COLORS: &[&str] = &["lightblue", "palegreen", "lightsalmon", "khaki", "plum", "lightcyan"];

/// Layout direction of the diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagramDirection {
    /// Top to bottom
    #[default]
    Tb,
    /// Left to right
    Lr,
}

impl DiagramDirection {
    fn rankdir(&self) -> &'static str {
        match self {
            DiagramDirection::Tb => "TB",
            DiagramDirection::Lr => "LR",
        }
    }
}

/// Escape text for use inside a quoted DOT string
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(id: &str) -> String {
    format!("\"{}\"", escape(id))
}

fn isolation_label(isolation: IsolationPolicy) -> &'static str {
    match isolation {
        IsolationPolicy::FullMesh => "full mesh",
        IsolationPolicy::None => "no isolation",
    }
}

fn link_label(link: &Link) -> String {
    let mut parts = Vec::new();
    if let Some(bandwidth) = link.bandwidth {
        parts.push(bandwidth.to_string());
    }
    if let Some(qos) = &link.qos_class {
        parts.push(escape(qos));
    }
    parts.join("\\n")
}

/// Generate DOT source for `topology`
pub fn generate_dot(topology: &Topology, name: &str, direction: DiagramDirection) -> String {
    let mut dot = String::new();
    dot.push_str(&format!("graph {} {{\n", quote(name)));
    dot.push_str(&format!("    rankdir={};\n", direction.rankdir()));
    dot.push_str(&format!("    label={};\n", quote(name)));
    dot.push_str("    labelloc=t;\n");
    dot.push_str("    node [fontname=\"Helvetica\"];\n\n");

    for (index, slice) in topology.slices.values().enumerate() {
        let color = SLICE_COLORS[index % SLICE_COLORS.len()];
        dot.push_str(&format!("    subgraph \"cluster_{}\" {{\n", index));
        dot.push_str(&format!(
            "        label={};\n",
            quote(&format!("{} ({})", slice.id, isolation_label(slice.isolation)))
        ));
        dot.push_str(&format!("        style=\"rounded,filled\";\n        fillcolor={};\n", color));

        for host in topology.slice_hosts(slice) {
            dot.push_str(&format!(
                "        {} [shape=box, label=\"{}\\n{}\"];\n",
                quote(&host.id),
                escape(&host.id),
                host.address
            ));
        }
        for switch in topology.access_switches().filter(|s| s.access_slice() == Some(slice.id.as_str())) {
            dot.push_str(&format!("        {} [shape=ellipse];\n", quote(&switch.id)));
        }
        dot.push_str("    }\n\n");
    }

    for switch in topology.boundary_switches() {
        dot.push_str(&format!(
            "    {} [shape=doubleoctagon, style=filled, fillcolor=lightgrey];\n",
            quote(&switch.id)
        ));
    }
    if topology.boundary_switches().next().is_some() {
        dot.push('\n');
    }

    for link in &topology.links {
        let mut attrs = Vec::new();
        let label = link_label(link);
        if !label.is_empty() {
            attrs.push(format!("label=\"{}\"", label));
        }
        if link.a.kind == NodeKind::Switch {
            attrs.push(format!("taillabel=\"{}\"", link.a.port));
        }
        if link.b.kind == NodeKind::Switch {
            attrs.push(format!("headlabel=\"{}\"", link.b.port));
        }
        let attrs = if attrs.is_empty() {
            String::new()
        } else {
            format!(" [{}]", attrs.join(", "))
        };
        dot.push_str(&format!("    {} -- {}{};\n", quote(&link.a.node), quote(&link.b.node), attrs));
    }

    dot.push_str("}\n");
    dot
}
