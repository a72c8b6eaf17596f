//! Background tasks module
//!
//! This module contains the timer state machine and the tasks that connect
//! it to the store.

pub mod persistence_writer;
pub mod state_machine;
pub mod store_sync;

// Re-export main functions
pub use state_machine::{spawn_timer, TimerHandle};
