//! External collaborators of the timer
//!
//! This module contains the durable value store and the countdown driver,
//! each as a trait plus the implementations the service ships with.

pub mod driver;
pub mod store;

// Re-export main types
pub use driver::{CountdownDriver, DriverEvent, DriverEventSender, DriverHandle, TokioDriver};
pub use store::{FileValueStore, MemoryValueStore, StoreError, ValueStore};
