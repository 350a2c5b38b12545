// Pacing Module
// Computes inter-event waits from race file timestamps and applies them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};

/// Fixed calendar day every timestamp is anchored to.
/// A race is assumed to fit within a single day.
fn dummy_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

fn anchor(time: NaiveTime) -> NaiveDateTime {
    dummy_date().and_time(time)
}

/// Wait before dispatching `current`, given the timestamp of the record
/// before it.
///
/// The first record (`previous == None`) goes out immediately. A time of day
/// earlier than its predecessor also yields zero rather than an error.
pub fn compute_wait(current: NaiveTime, previous: Option<NaiveTime>) -> Duration {
    let Some(previous) = previous else {
        return Duration::ZERO;
    };

    (anchor(current) - anchor(previous))
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Suspends the replay loop between records.
///
/// `speed` scales every wait; `1.0` replays in real time.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    speed: f64,
}

impl Default for Pacer {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay faster (`> 1.0`) or slower (`< 1.0`) than recorded.
    /// Non-positive or non-finite values fall back to real time.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        self
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Scaled wait between two records.
    /// Saturates at `Duration::MAX` when a tiny speed overflows the wait.
    pub fn wait_for(&self, current: NaiveTime, previous: Option<NaiveTime>) -> Duration {
        let wait = compute_wait(current, previous);
        if self.speed == 1.0 {
            wait
        } else {
            Duration::try_from_secs_f64(wait.as_secs_f64() / self.speed).unwrap_or(Duration::MAX)
        }
    }
}

/// Sleep for `wait` while watching in-flight tasks.
///
/// Every task that finishes during the sleep is handed to `reap`. The first
/// error `reap` returns ends the sleep early and is returned.
pub async fn suspend<T, E>(
    wait: Duration,
    in_flight: &mut JoinSet<T>,
    mut reap: impl FnMut(Result<T, JoinError>) -> Result<(), E>,
) -> Result<(), E>
where
    T: 'static,
{
    if wait.is_zero() {
        return Ok(());
    }

    let sleep = tokio::time::sleep(wait);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            Some(joined) = in_flight.join_next() => reap(joined)?,
        }
    }
}
