//! # SliceNet - Topology and flow-policy compiler for sliced virtual networks
//!
//! This library turns a declarative description of a multi-tenant network
//! (hosts, switches, links, slices and the rules that govern traffic between
//! slices) into per-switch OpenFlow rule tables, controller assignments and
//! diagrams.
//!
//! ## Overview
//!
//! A network is partitioned into slices. Each slice owns its hosts and its
//! access switches, and forwards traffic among them as a static full mesh
//! (or with plain L2 switching when isolation is off). Slices meet only at
//! boundary switches, where explicit boundary rules decide which ingress
//! traffic leaves through which ports, optionally filtered by IP protocol or
//! 802.1p priority tag.
//!
//! ## Key Features
//!
//! - **Fail-fast validation**: dangling links, duplicate ports, hosts in the
//!   wrong number of slices and competing boundary rules are rejected before
//!   any rule is produced
//! - **Deterministic output**: the same declaration always yields the same
//!   port numbers, rules and byte-identical JSON
//! - **Shadowing-free boundary tables**: protocol- or tag-filtered rules are
//!   always placed above general rules on the same ingress port
//! - **Controller fail-over groups**: every switch gets an ordered list of
//!   controllers, primary first
//! - **Latency reports**: summarize `ping` output as min/avg/max/jitter
//!
//! ## Architecture
//!
//! - `model`: typed entities (hosts, switches, ports, links, slices, rules)
//! - `topology`: validated graph assembly and port numbering
//! - `policy`: boundary rule resolution and conflict detection
//! - `compiler`: per-switch flow tables
//! - `controller`: controller fail-over groups
//! - `events`: compiler observer hooks
//! - `config` / `config_loader`: YAML declaration parsing and validation
//! - `export`: `ovs-ofctl` script, Graphviz diagram, JSON artifacts
//! - `metrics`: latency sample parsing and summaries
//! - `orchestrator`: high-level flow from declaration to artifacts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use slicenet::{config_loader, events::LogObserver, orchestrator};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("configs/enterprise.yaml"))?;
//! let plan = orchestrator::generate_artifacts(
//!     &config,
//!     &config.compile_options(),
//!     Path::new("slicenet_output"),
//!     &LogObserver,
//! )?;
//!
//! // slicenet_output now contains rules.json, flows.sh, topology.json,
//! // topology.dot and controllers.json
//! println!("{} rules", plan.compilation.rules.rule_count());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   name: enterprise
//!   unrouted_ports: warn     # warn / drop / normal
//!
//! controllers:
//!   - { name: c0, ip: 127.0.0.1, port: 6633 }
//!
//! switches:
//!   - name: s1
//!   - name: s9
//!
//! hosts:
//!   - { name: h1, ip: 10.0.0.1/8 }
//!   - { name: srv1 }
//!
//! links:
//!   - { from: h1, to: s1, bandwidth: 10 }
//!   - { from: s1, to: s9, to_port: 1 }
//!   - { from: s9, to: srv1, from_port: 5 }
//!
//! slices:
//!   - { name: office, hosts: [h1], switches: [s1] }
//!   - { name: servers, isolation: none, hosts: [srv1] }
//!
//! boundary_rules:
//!   - { switch: s9, slice: office, priority: 10, egress: [srv1] }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed errors built with `thiserror`
//! ([`error::CompileError`], [`config::ValidationError`]). Effectful entry
//! points and the binaries use `color_eyre` for reporting with context.

pub mod model;
pub mod error;
pub mod utils;
pub mod ip;
pub mod topology;
pub mod policy;
pub mod compiler;
pub mod controller;
pub mod events;
pub mod config;
pub mod config_loader;
pub mod export;
pub mod metrics;
pub mod orchestrator;
