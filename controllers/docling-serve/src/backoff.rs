//! # Fibonacci Backoff
//!
//! Requeue delays for DoclingServes whose last pass failed. Delays grow along
//! the Fibonacci sequence in whole minutes (1m, 1m, 2m, 3m, 5m, 8m, 10m with
//! the default bounds) and reset once a pass succeeds.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, capped at `max_minutes`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Return the current delay and advance the sequence
    pub fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes * 60);
        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);
        delay
    }

    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

/// Backoff state for one DoclingServe
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Per-object backoff bookkeeping keyed by `namespace/name`.
#[derive(Debug)]
pub struct BackoffTracker {
    min_minutes: u64,
    max_minutes: u64,
    states: Mutex<HashMap<String, BackoffState>>,
}

impl BackoffTracker {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            max_minutes,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failed pass and return the delay before the next one
    ///
    /// Returns (delay, consecutive error count)
    pub fn record_failure(&self, key: &str) -> (Duration, u32) {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states.entry(key.to_string()).or_insert_with(|| BackoffState {
                    backoff: FibonacciBackoff::new(self.min_minutes, self.max_minutes),
                    error_count: 0,
                });
                state.error_count += 1;
                (state.backoff.next_delay(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                (Duration::from_secs(self.min_minutes * 60), 0)
            }
        }
    }

    /// Forget the error history of `key` after a successful pass
    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }
}
