//! Delivery tracking for replay runs.
//!
//! This module keeps per-target message counters that dispatch tasks update
//! concurrently as responses come back, and produces the end-of-run report.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counters {
    /// Targets in first-seen order with their delivered message count
    entries: Vec<DeliveryCount>,
    /// Position of each target in `entries`
    index: HashMap<String, usize>,
}

impl Counters {
    fn slot(&mut self, target_id: &str) -> &mut DeliveryCount {
        let position = match self.index.get(target_id).copied() {
            Some(position) => position,
            None => {
                let position = self.entries.len();
                self.entries.push(DeliveryCount {
                    target_id: target_id.to_string(),
                    messages: 0,
                });
                self.index.insert(target_id.to_string(), position);
                position
            }
        };
        &mut self.entries[position]
    }
}

/// Per-target delivery counters for one replay run.
///
/// Counts only ever grow. Targets are reported in the order they were first
/// registered.
#[derive(Debug, Default)]
pub struct DeliveryTracker {
    counters: Mutex<Counters>,
}

impl DeliveryTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters stay consistent across a panicking holder: every update is
    /// a single push or increment, so a poisoned lock is still usable.
    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a target with a zero count if it has not been seen yet
    pub fn register(&self, target_id: &str) {
        self.counters().slot(target_id);
    }

    /// Record one delivered message for a target
    pub fn record_delivery(&self, target_id: &str) {
        self.counters().slot(target_id).messages += 1;
    }

    /// Current count for a target, `None` if it was never seen
    pub fn count(&self, target_id: &str) -> Option<u64> {
        let counters = self.counters();
        let position = *counters.index.get(target_id)?;
        Some(counters.entries[position].messages)
    }

    /// Total delivered messages across all targets
    pub fn total(&self) -> u64 {
        self.report().iter().map(|entry| entry.messages).sum()
    }

    /// Per-target counts in first-seen order
    pub fn report(&self) -> Vec<DeliveryCount> {
        self.counters().entries.clone()
    }
}

/// Delivered message count for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCount {
    pub target_id: String,
    pub messages: u64,
}

impl fmt::Display for DeliveryCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target_id, self.messages)
    }
}

/// Outcome of a completed replay run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// Number of events sent
    pub dispatched: usize,
    /// Per-target delivery counts in first-seen order
    pub deliveries: Vec<DeliveryCount>,
}

impl ReplaySummary {
    pub fn delivered(&self) -> u64 {
        self.deliveries.iter().map(|entry| entry.messages).sum()
    }

    /// Count for one target, `None` if it never appeared
    pub fn messages_for(&self, target_id: &str) -> Option<u64> {
        self.deliveries
            .iter()
            .find(|entry| entry.target_id == target_id)
            .map(|entry| entry.messages)
    }
}

/// Shared tracker handle for use across dispatch tasks
pub type SharedTracker = Arc<DeliveryTracker>;

/// Create a new shared tracker instance
pub fn new_shared_tracker() -> SharedTracker {
    Arc::new(DeliveryTracker::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_starts_at_zero() {
        let tracker = DeliveryTracker::new();
        tracker.register("car-1");
        assert_eq!(tracker.count("car-1"), Some(0));
        assert_eq!(tracker.count("car-2"), None);
    }

    #[test]
    fn test_register_is_idempotent() {
        let tracker = DeliveryTracker::new();
        tracker.register("car-1");
        tracker.record_delivery("car-1");
        tracker.register("car-1");
        assert_eq!(tracker.count("car-1"), Some(1));
        assert_eq!(tracker.report().len(), 1);
    }

    #[test]
    fn test_report_in_first_seen_order() {
        let tracker = DeliveryTracker::new();
        tracker.register("car-2");
        tracker.register("car-1");
        tracker.register("car-3");
        tracker.record_delivery("car-1");
        tracker.record_delivery("car-1");
        tracker.record_delivery("car-2");

        let report = tracker.report();
        let lines: Vec<String> = report.iter().map(|entry| entry.to_string()).collect();
        assert_eq!(lines, vec!["car-2: 1", "car-1: 2", "car-3: 0"]);
        assert_eq!(tracker.total(), 3);
    }

    #[test]
    fn test_counts_survive_poisoned_lock() {
        let tracker = Arc::new(DeliveryTracker::new());
        tracker.register("car-1");
        tracker.record_delivery("car-1");

        let poisoner = tracker.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.counters.lock().unwrap();
            panic!("dispatch task died holding the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(tracker.counters.is_poisoned());

        tracker.record_delivery("car-1");
        tracker.register("car-2");
        let lines: Vec<String> = tracker.report().iter().map(|e| e.to_string()).collect();
        assert_eq!(lines, vec!["car-1: 2", "car-2: 0"]);
        assert_eq!(tracker.count("car-1"), Some(2));
    }

    #[test]
    fn test_summary_lookup() {
        let summary = ReplaySummary {
            dispatched: 3,
            deliveries: vec![
                DeliveryCount {
                    target_id: "car-1".to_string(),
                    messages: 2,
                },
                DeliveryCount {
                    target_id: "car-2".to_string(),
                    messages: 1,
                },
            ],
        };
        assert_eq!(summary.delivered(), 3);
        assert_eq!(summary.messages_for("car-2"), Some(1));
        assert_eq!(summary.messages_for("car-9"), None);
    }
}
