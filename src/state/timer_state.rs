//! Timer state structure and time formatting

use serde::{Deserialize, Serialize};

/// Snapshot of the countdown as seen by the presentation layer.
///
/// A new value replaces the previous one on every transition; nothing outside
/// the state machine mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Time left on the active or most recently configured timer
    pub remaining_ms: i64,
    /// `remaining_ms` rendered as `MM:SS`
    pub formatted: String,
    /// Raw text the user is composing for a new duration
    pub pending_input: String,
    pub is_running: bool,
    pub is_paused: bool,
    /// One-shot flag: start was requested with nothing to count down
    pub is_input_empty: bool,
    /// Last persistence failure, cleared by the next value the store emits
    pub store_error: Option<String>,
}

impl TimerState {
    /// Create a new stopped timer with nothing remaining
    pub fn new() -> Self {
        Self {
            remaining_ms: 0,
            formatted: format_time(0),
            pending_input: String::new(),
            is_running: false,
            is_paused: false,
            is_input_empty: false,
            store_error: None,
        }
    }

    /// Replace the remaining time, keeping the display in sync
    pub fn with_remaining(mut self, remaining_ms: i64) -> Self {
        self.remaining_ms = remaining_ms.max(0);
        self.formatted = format_time(self.remaining_ms);
        self
    }

    /// Whether the countdown is actively ticking
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Format milliseconds as "MM:SS". Minutes are not capped, so durations past
/// 99 minutes widen the field instead of wrapping.
pub fn format_time(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let m = total_secs / 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}", m, s)
}
