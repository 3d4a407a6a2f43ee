// =============================================================================
// Central Application State — Helios Sentinel
// =============================================================================
//
// Shared between the scheduler loop and the REST API.  Holds the immutable
// run configuration plus capped ring buffers of recent run records and
// errors for the dashboard endpoints.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the mutable collections.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::advisory::PositionAdvice;
use crate::config::SentinelConfig;
use crate::types::RunOutcome;

/// Maximum number of recent run records to retain.
const MAX_RECENT_RUNS: usize = 100;
/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Auditable record of one completed sentinel run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// Unique identifier for this run (UUID v4).
    pub id: String,

    /// ISO 8601 timestamp of when the run completed.
    pub at: String,

    /// Instrument the run evaluated.
    pub instrument: String,

    pub outcome: RunOutcome,

    /// The full report text that was (or would have been) delivered.
    pub report: String,

    /// Entry/target/stop set, present only when the signal fired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<PositionAdvice>,
}

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Central application state shared across tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation.
    pub state_version: AtomicU64,

    /// Run configuration, loaded once per process and treated as immutable
    /// for the lifetime of each run.
    pub config: Arc<RwLock<SentinelConfig>>,

    pub recent_runs: RwLock<Vec<RunRecord>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Instant when the sentinel was started, for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: SentinelConfig) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            config: Arc::new(RwLock::new(config)),
            recent_runs: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Run Records ─────────────────────────────────────────────────────

    /// Record a completed run.  The ring buffer is capped at
    /// [`MAX_RECENT_RUNS`]; oldest entries are evicted at the limit.
    pub fn push_run(&self, record: RunRecord) {
        let mut runs = self.recent_runs.write();
        runs.push(record);
        while runs.len() > MAX_RECENT_RUNS {
            runs.remove(0);
        }

        self.increment_version();
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message.  The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted at the limit.
    pub fn push_error(&self, message: String) {
        let record = ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> RunRecord {
        RunRecord {
            id: format!("run-{n}"),
            at: Utc::now().to_rfc3339(),
            instrument: "BTC-USDT-SWAP".to_string(),
            outcome: RunOutcome::Evaluated { long_signal: false },
            report: String::new(),
            advice: None,
        }
    }

    #[test]
    fn run_ring_buffer_is_capped() {
        let state = AppState::new(SentinelConfig::default());
        for n in 0..(MAX_RECENT_RUNS + 10) {
            state.push_run(record(n));
        }
        let runs = state.recent_runs.read();
        assert_eq!(runs.len(), MAX_RECENT_RUNS);
        // Oldest entries were evicted first.
        assert_eq!(runs.first().unwrap().id, "run-10");
    }

    #[test]
    fn push_increments_version() {
        let state = AppState::new(SentinelConfig::default());
        let before = state.current_state_version();
        state.push_error("boom".to_string());
        assert!(state.current_state_version() > before);
    }
}
