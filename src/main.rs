//! RaceSim CLI - Race Traffic Simulator
//!
//! Usage:
//!   racesim --racefile <FILE> --raceid <ID> --demozone <ZONE> [OPTIONS]
//!
//! Examples:
//!   racesim -r race.csv -i 42 -d PARIS
//!   racesim -r race.csv -i 42 -d MADRID --verbose
//!   racesim -r race.csv -i 42 -d LISBON --config racesim.yaml
//!   racesim -r race.csv -i 42 -d BERLIN --base-url http://gateway:8888 --speed 10

use clap::Parser;
use racesim::cli::{Config, ConfigError};
use racesim::{Demozone, ReplayError, SimulationContext};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "racesim")]
#[command(author, version, about = "Race simulator for IoT gateway testing & stressing", long_about = None)]
struct Cli {
    /// Race data used for simulation
    #[arg(short = 'r', long, value_name = "FILE")]
    racefile: PathBuf,

    /// Race ID used for the simulation
    #[arg(short = 'i', long, value_name = "NUMBER")]
    raceid: u64,

    /// Demozone used for the simulation
    #[arg(short = 'd', long, value_enum)]
    demozone: Demozone,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway base URL (overrides the configuration file)
    #[arg(long, env = "RACESIM_BASE_URL")]
    base_url: Option<String>,

    /// Playback speed multiplier (overrides the configuration file)
    #[arg(long)]
    speed: Option<f64>,
}

fn build_config(
    config_file: Option<PathBuf>,
    base_url: Option<String>,
    speed: Option<f64>,
) -> Result<Config, ConfigError> {
    let mut config = if let Some(path) = config_file {
        Config::from_file(&path)?
    } else {
        Config::default()
    };

    // Override with CLI arguments
    if let Some(base_url) = base_url {
        config.target.base_url = base_url;
    }
    if let Some(speed) = speed {
        config.replay.speed = speed;
    }
    config.validate()?;

    Ok(config)
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let directive = if verbose {
        "racesim=debug"
    } else {
        "racesim=info"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    Ok(())
}

async fn run(cli: Cli) -> Result<(), ReplayError> {
    let config = build_config(cli.config, cli.base_url, cli.speed)?;
    let context = SimulationContext::new(cli.raceid, cli.demozone);

    racesim::cli::run_replay(config, context, &cli.racefile, cli.verbose).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            if e.is_startup_error() {
                eprintln!("Run with --help for usage.");
            }
            ExitCode::FAILURE
        }
    }
}
