// Replay Errors Module
// Failures that end a replay run.

use crate::cli::ConfigError;
use crate::dispatch::DispatchError;
use crate::event::ParseError;
use std::path::PathBuf;

/// Any error that aborts a replay run
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read race file {}: {source}", .path.display())]
    RaceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed record at line {line}: {source}")]
    Parse {
        /// One-based line number in the race file
        line: usize,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Dispatch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ReplayError {
    /// Whether the run failed before any event could have been sent
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            ReplayError::RaceFile { .. }
                | ReplayError::Config(_)
                | ReplayError::Dispatch(DispatchError::Client(_))
        )
    }
}
