//! CLI module for RaceSim replay functionality.
//!
//! This module provides the `racesim` command implementation.

mod config;

pub use config::{Config, ConfigError, ReplayConfig, TargetConfig};

use crate::context::SimulationContext;
use crate::errors::ReplayError;
use crate::replay::{Progress, Replayer};
use crate::stats::ReplaySummary;
use crate::timeline::Timeline;
use std::path::Path;

/// Replay a race file and print the per-target delivery report
pub async fn run_replay(
    config: Config,
    context: SimulationContext,
    race_file: impl AsRef<Path>,
    verbose: bool,
) -> Result<ReplaySummary, ReplayError> {
    let race_file = race_file.as_ref();
    let timeline = Timeline::from_file(race_file).map_err(|source| ReplayError::RaceFile {
        path: race_file.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Processing race file: {} ({} entries)",
        race_file.display(),
        timeline.len()
    );
    tracing::info!(
        "Simulating race id {} for demozone {}",
        context.race_id,
        context.demozone
    );
    tracing::info!("Gateway: {}", config.target.base_url);

    let progress = if verbose {
        Progress::Silent
    } else {
        Progress::Dots
    };
    let summary = Replayer::new(&config, context)?
        .with_progress(progress)
        .run(&timeline)
        .await?;

    for entry in &summary.deliveries {
        println!("{}", entry);
    }

    Ok(summary)
}
