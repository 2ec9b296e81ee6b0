//! Latency report CLI.
//!
//! Summarizes round-trip samples collected between hosts of a running
//! network, either raw `ping` output or one value per line.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use slicenet::export::write_json;
use slicenet::metrics::{self, LatencySummary};

#[derive(Parser)]
#[command(name = "latency-report")]
#[command(about = "Summarize latency samples as min/avg/max and jitter")]
#[command(version)]
struct Cli {
    /// File with `ping` output or one latency value (ms) per line
    #[arg(short, long)]
    input: PathBuf,

    /// Write the summary as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Label of the probed host, e.g. its address
    #[arg(short, long)]
    target: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct LatencyReport {
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    source: String,
    summary: LatencySummary,
    samples: Vec<f64>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level)).init();

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let samples = metrics::parse_samples(&text)
        .with_context(|| format!("Failed to parse {}", cli.input.display()))?;
    log::info!("Read {} samples from {}", samples.len(), cli.input.display());

    let summary = metrics::summarize(&samples)?;
    println!("{}", metrics::render_text(&summary, cli.target.as_deref()));

    if let Some(output) = &cli.output {
        let report = LatencyReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            target: cli.target.clone(),
            source: cli.input.display().to_string(),
            summary,
            samples,
        };
        write_json(&report, output)?;
    }

    Ok(())
}
