//! State management module
//!
//! This module contains the timer data model, the pure reducer, and the
//! shared application state handed to the HTTP layer.

pub mod app_state;
pub mod intent;
pub mod reducer;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use intent::TimerIntent;
pub use reducer::{reduce, refresh, Effect, Transition};
pub use timer_state::{format_time, TimerState};
