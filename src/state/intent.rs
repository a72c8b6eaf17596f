//! User and system requests fed into the timer state machine

use serde::{Deserialize, Serialize};

/// One discrete request for the state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerIntent {
    /// Primary action: fresh start, resume, or report empty input
    StartTimer,
    PauseTimer,
    UnPauseTimer,
    StopTimer,
    /// Acknowledge the empty-input signal
    ResetInputError,
    /// Replace the duration text being composed
    ChangeInput { text: String },
    /// Countdown progress in milliseconds
    Tick { remaining_ms: i64 },
}

impl TimerIntent {
    /// Short name used for logging and last action tracking
    pub fn name(&self) -> &'static str {
        match self {
            TimerIntent::StartTimer => "start",
            TimerIntent::PauseTimer => "pause",
            TimerIntent::UnPauseTimer => "unpause",
            TimerIntent::StopTimer => "stop",
            TimerIntent::ResetInputError => "reset-input-error",
            TimerIntent::ChangeInput { .. } => "input",
            TimerIntent::Tick { .. } => "tick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_deserialize_from_tagged_json() {
        let intent: TimerIntent =
            serde_json::from_str(r#"{"type":"change_input","text":"90"}"#).unwrap();
        assert_eq!(intent, TimerIntent::ChangeInput { text: "90".to_string() });

        let intent: TimerIntent = serde_json::from_str(r#"{"type":"un_pause_timer"}"#).unwrap();
        assert_eq!(intent, TimerIntent::UnPauseTimer);
    }
}
