//! # RaceSim - Race Traffic Simulator
//!
//! Replays a recorded race against an IoT gateway, preserving the original
//! timing between events so the gateway sees a realistic load pattern.
//!
//! ## Features
//!
//! - Timestamp-driven pacing (the gap between two records is the gap between
//!   their times of day)
//! - Routing of `data` and `alert` events to separate gateway endpoints
//! - Race id and demozone stamped onto every payload
//! - Fire-and-forget dispatch with per-target delivery counts
//!
//! ## Race file format
//!
//! One event per line, four `;`-separated fields:
//!
//! ```text
//! 10:00:00;data;car-1;{"speed":80}
//! 10:00:02;alert;car-1;{"code":5}
//! ```
//!
//! ## Usage
//!
//! ### As a CLI
//!
//! ```bash
//! racesim --racefile race.csv --raceid 42 --demozone PARIS
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use racesim::{cli::Config, Demozone, Progress, Replayer, SimulationContext, Timeline};
//!
//! # async fn demo() -> Result<(), racesim::ReplayError> {
//! let timeline = Timeline::from_text("10:00:00;data;car-1;{\"speed\":80}\n");
//! let context = SimulationContext::new(42, Demozone::Paris);
//!
//! let summary = Replayer::new(&Config::default(), context)?
//!     .with_progress(Progress::Silent)
//!     .run(&timeline)
//!     .await?;
//! assert_eq!(summary.messages_for("car-1"), Some(1));
//! # Ok(())
//! # }
//! ```

// Core library modules
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod pacing;
pub mod replay;
pub mod stats;
pub mod timeline;

// CLI module (for the `racesim` binary)
pub mod cli;

// Re-export commonly used types
pub use context::{Demozone, SimulationContext};
pub use dispatch::{DispatchError, Dispatcher, OutboundMessage};
pub use errors::ReplayError;
pub use event::{parse_record, EventType, ParseError, RaceEvent};
pub use pacing::{compute_wait, Pacer};
pub use replay::{Progress, Replayer};
pub use stats::{new_shared_tracker, DeliveryCount, DeliveryTracker, ReplaySummary, SharedTracker};
pub use timeline::{Timeline, TimelineEntry};
