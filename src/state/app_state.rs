//! Main application state management

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{TimerIntent, TimerState};
use crate::tasks::TimerHandle;

/// The most recent intent accepted over HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAction {
    pub name: &'static str,
    pub at: DateTime<Utc>,
}

/// Shared state handed to every HTTP handler
#[derive(Debug)]
pub struct AppState {
    /// Handle to the running timer state machine
    pub timer: TimerHandle,
    pub started_at: Instant,
    pub port: u16,
    pub host: String,
    last_action: Mutex<Option<LastAction>>,
}

impl AppState {
    /// Create a new AppState around a running timer
    pub fn new(timer: TimerHandle, port: u16, host: String) -> Self {
        Self {
            timer,
            started_at: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Send an intent to the timer and return the state it produced
    pub async fn dispatch(&self, intent: TimerIntent) -> Result<TimerState, String> {
        let name = intent.name();
        debug!("Dispatching {} intent", name);
        let state = self.timer.dispatch(intent).await?;

        if let Ok(mut last) = self.last_action.lock() {
            *last = Some(LastAction {
                name,
                at: Utc::now(),
            });
        }
        Ok(state)
    }

    /// Get current timer state
    pub fn get_timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn uptime(&self) -> String {
        format_uptime(self.started_at.elapsed())
    }

    /// Intent most recently dispatched through this state, if any
    pub fn last_action(&self) -> Option<LastAction> {
        self.last_action.lock().ok().and_then(|last| last.clone())
    }
}

/// Render a duration as `42s`, `3m 07s` or `2h 00m 05s`, dropping leading zero units
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {:02}s", m, s),
        (h, m, s) => format!("{}h {:02}m {:02}s", h, m, s),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        services::{driver::testing::RecordingDriver, MemoryValueStore},
        tasks::spawn_timer,
    };

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_secs(59)), "59s");
        assert_eq!(format_uptime(Duration::from_secs(187)), "3m 07s");
        assert_eq!(format_uptime(Duration::from_secs(7_205)), "2h 00m 05s");
        assert_eq!(format_uptime(Duration::from_millis(1_999)), "1s");
    }

    #[tokio::test]
    async fn test_dispatch_records_last_action() {
        let timer = spawn_timer(Arc::new(MemoryValueStore::new()), RecordingDriver::new());
        let state = AppState::new(timer, 20554, "127.0.0.1".to_string());
        assert_eq!(state.last_action(), None);

        state.dispatch(TimerIntent::StopTimer).await.unwrap();
        let before = Utc::now();
        state.dispatch(TimerIntent::StartTimer).await.unwrap();

        let last = state.last_action().unwrap();
        assert_eq!(last.name, "start");
        assert!(last.at >= before);
    }
}
