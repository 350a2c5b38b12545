//! Replay orchestration.
//!
//! Walks a [`Timeline`] one record at a time: parse, wait out the recorded
//! gap since the previous record, then hand the event to a dispatch task and
//! move on without waiting for the gateway's response. Once the last record
//! is sent, every in-flight dispatch is drained before the summary is built.
//!
//! A transport failure in any dispatch task aborts the run.

use crate::cli::Config;
use crate::context::SimulationContext;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::errors::ReplayError;
use crate::event::parse_record;
use crate::pacing::{suspend, Pacer};
use crate::stats::{new_shared_tracker, ReplaySummary, SharedTracker};
use crate::timeline::Timeline;
use reqwest::StatusCode;
use std::io::Write;
use tokio::task::{JoinError, JoinSet};

type DispatchResult = Result<StatusCode, DispatchError>;

/// Console feedback while a replay runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Progress {
    /// One `.` on stdout per dispatched event
    #[default]
    Dots,
    /// Nothing on stdout; per-event detail goes to the log instead
    Silent,
}

impl Progress {
    fn tick(&self) {
        if *self == Progress::Dots {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(b".");
            let _ = stdout.flush();
        }
    }

    fn finish(&self) {
        if *self == Progress::Dots {
            println!();
        }
    }
}

/// Drives one replay run against the gateway
pub struct Replayer {
    dispatcher: Dispatcher,
    tracker: SharedTracker,
    pacer: Pacer,
    context: SimulationContext,
    progress: Progress,
}

impl Replayer {
    /// Build a replayer with a fresh delivery tracker
    pub fn new(config: &Config, context: SimulationContext) -> Result<Self, ReplayError> {
        config.validate()?;

        let tracker = new_shared_tracker();
        let dispatcher = Dispatcher::new(config.target.clone(), context, tracker.clone())?;

        Ok(Self {
            dispatcher,
            tracker,
            pacer: Pacer::new().with_speed(config.replay.speed),
            context,
            progress: Progress::default(),
        })
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Delivery counters for this run
    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    /// Replay every record of the timeline in order.
    ///
    /// Stops at the first malformed record or transport failure. Records
    /// before a malformed one have already been sent by then. The progress
    /// line is terminated either way.
    pub async fn run(&self, timeline: &Timeline) -> Result<ReplaySummary, ReplayError> {
        let outcome = self.replay(timeline).await;
        self.progress.finish();
        let dispatched = outcome?;

        tracing::info!(dispatched, "Processing completed");

        Ok(ReplaySummary {
            dispatched,
            deliveries: self.tracker.report(),
        })
    }

    /// Send every record, returning how many were dispatched
    async fn replay(&self, timeline: &Timeline) -> Result<usize, ReplayError> {
        tracing::info!(
            race_id = self.context.race_id,
            demozone = %self.context.demozone,
            records = timeline.len(),
            speed = self.pacer.speed(),
            "Starting replay"
        );

        let mut in_flight: JoinSet<DispatchResult> = JoinSet::new();
        let mut dispatched = 0;

        for entry in timeline.entries() {
            let (event, previous) =
                parse_record(entry.line, entry.previous).map_err(|source| ReplayError::Parse {
                    line: entry.line_number,
                    source,
                })?;

            let wait = self.pacer.wait_for(event.timestamp, previous);
            if !wait.is_zero() {
                tracing::trace!(
                    index = entry.index,
                    wait_ms = wait.as_millis() as u64,
                    "Waiting"
                );
            }
            suspend(wait, &mut in_flight, reap).await?;

            self.tracker.register(&event.target_id);
            let message = self.dispatcher.prepare(entry.index, event);
            tracing::debug!(
                index = message.index,
                event_type = %message.event_type,
                target = %message.target_id,
                body = %message.body,
                "Sending"
            );
            self.progress.tick();

            let dispatcher = self.dispatcher.clone();
            in_flight.spawn(async move { dispatcher.send(message).await });
            dispatched += 1;

            while let Some(joined) = in_flight.try_join_next() {
                reap(joined)?;
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            reap(joined)?;
        }

        Ok(dispatched)
    }
}

/// Surface the outcome of a finished dispatch task
fn reap(joined: Result<DispatchResult, JoinError>) -> Result<(), ReplayError> {
    joined??;
    Ok(())
}
