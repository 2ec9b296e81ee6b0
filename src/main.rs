use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;

use slicenet::compiler::UnroutedPortPolicy;
use slicenet::config_loader;
use slicenet::events::LogObserver;
use slicenet::orchestrator;

/// Topology and flow-policy compiler for sliced virtual networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the network declaration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory for rules, flow script, topology and diagram
    #[arg(short, long, default_value = "slicenet_output")]
    output: PathBuf,

    /// Fail on slices without access switches
    #[arg(long)]
    strict: bool,

    /// What to install on ports no rule covers (warn, drop, normal)
    #[arg(long)]
    unrouted: Option<UnroutedPortPolicy>,

    /// Validate and compile only, write nothing
    #[arg(long)]
    check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    info!("Starting SliceNet compiler");
    info!("Configuration file: {:?}", args.config);

    // Load and validate the declaration
    let config = config_loader::load_config(&args.config)?;

    // Command-line flags override the document's compile settings
    let mut options = config.compile_options();
    if args.strict {
        options.strict = true;
    }
    if let Some(mode) = args.unrouted {
        options.unrouted_ports = mode;
    }

    // Dry run: compile without touching the output directory
    if args.check {
        let declaration = config.to_declaration()?;
        let plan = orchestrator::plan(&declaration, &options, &LogObserver)
            .wrap_err_with(|| format!("Network '{}' does not compile", config.general.name))?;
        if !plan.compilation.warnings.is_empty() {
            warn!("{} ports are unrouted", plan.compilation.warnings.len());
        }
        info!("Check passed, no files written");
        return Ok(());
    }

    // Write rules, flow script, topology, diagram and controller groups
    info!("Output directory: {:?}", args.output);
    orchestrator::generate_artifacts(&config, &options, &args.output, &LogObserver)?;

    info!(
        "Apply with: sh {}",
        args.output.join(orchestrator::FLOWS_FILE).display()
    );
    Ok(())
}
