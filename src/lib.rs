//! Egg Timer - A single countdown timer whose state survives restarts
//!
//! This library provides the timer state machine, the durable value store
//! and countdown driver it coordinates, and an HTTP binding for the
//! presentation layer.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerIntent, TimerState};
pub use api::create_router;
pub use tasks::{spawn_timer, TimerHandle};
pub use utils::signals::shutdown_signal;
