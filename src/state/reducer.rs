//! Pure timer transition logic
//!
//! `reduce` maps the current state and one intent to the next state plus the
//! side effects the caller must perform, in order. Nothing here touches the
//! store or the driver directly.

use super::{TimerIntent, TimerState};

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Write the remaining milliseconds to the durable store
    Persist(i64),
    /// Cancel the active countdown driver, if any
    CancelDriver,
    /// Start a countdown driver for the given milliseconds
    StartDriver(i64),
}

/// Result of applying one intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: TimerState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: TimerState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    fn state_only(state: TimerState) -> Self {
        Self::new(state, Vec::new())
    }
}

/// Apply one intent to the current state
pub fn reduce(current: &TimerState, intent: TimerIntent) -> Transition {
    let mut next = current.clone();

    match intent {
        TimerIntent::ChangeInput { text } => {
            next.pending_input = text;
            Transition::state_only(next)
        }

        TimerIntent::StartTimer => start(next),

        TimerIntent::PauseTimer => {
            if !next.is_running {
                return Transition::state_only(next);
            }
            next.is_paused = true;
            Transition::new(next, vec![Effect::CancelDriver])
        }

        TimerIntent::UnPauseTimer => {
            if !next.is_running {
                return Transition::state_only(next);
            }
            next.pending_input.clear();
            next.is_paused = false;
            let remaining = next.remaining_ms;
            Transition::new(next, vec![Effect::CancelDriver, Effect::StartDriver(remaining)])
        }

        TimerIntent::StopTimer => {
            next = next.with_remaining(0);
            next.is_running = false;
            next.is_paused = false;
            Transition::new(next, vec![Effect::Persist(0), Effect::CancelDriver])
        }

        TimerIntent::ResetInputError => {
            next.is_input_empty = false;
            Transition::state_only(next)
        }

        TimerIntent::Tick { remaining_ms } => {
            next = next.with_remaining(remaining_ms);
            let remaining = next.remaining_ms;
            Transition::new(next, vec![Effect::Persist(remaining)])
        }
    }
}

/// Overwrite the remaining time with a value emitted by the store
pub fn refresh(current: &TimerState, stored_ms: i64) -> TimerState {
    let mut next = current.clone().with_remaining(stored_ms);
    next.store_error = None;
    next
}

fn start(mut next: TimerState) -> Transition {
    if !next.pending_input.is_empty() {
        let parsed = parse_duration_ms(&next.pending_input);
        next.pending_input.clear();

        return match parsed {
            Some(duration_ms) => {
                next = next.with_remaining(duration_ms);
                next.is_running = true;
                next.is_paused = false;
                Transition::new(
                    next,
                    vec![
                        Effect::Persist(duration_ms),
                        Effect::CancelDriver,
                        Effect::StartDriver(duration_ms),
                    ],
                )
            }
            // Non-positive or unparseable input is dropped without a signal
            None => Transition::state_only(next),
        };
    }

    if next.remaining_ms == 0 {
        next.is_input_empty = true;
        return Transition::state_only(next);
    }

    // Resuming a timer that is already running would start a second driver
    if next.is_running {
        return Transition::state_only(next);
    }

    next.is_running = true;
    next.is_paused = false;
    let remaining = next.remaining_ms;
    Transition::new(next, vec![Effect::CancelDriver, Effect::StartDriver(remaining)])
}

/// Parse whole seconds typed by the user into milliseconds.
///
/// Returns `None` for anything that is not a positive integer that fits once
/// converted to milliseconds.
pub fn parse_duration_ms(input: &str) -> Option<i64> {
    let seconds: i64 = input.trim().parse().ok()?;
    if seconds <= 0 {
        return None;
    }
    seconds.checked_mul(1000)
}
