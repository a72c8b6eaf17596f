//! Ordered persistence writes

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::state_machine::Event;
use crate::services::ValueStore;

/// Background task that writes values to the store one at a time, in the
/// order they were queued. Every finished write is reported back to the
/// state machine; after a failure the next queued value is still attempted.
pub async fn persistence_writer_task<S: ValueStore>(
    store: Arc<S>,
    mut writes: mpsc::UnboundedReceiver<i64>,
    events: mpsc::WeakUnboundedSender<Event>,
) {
    debug!("Starting persistence writer task");

    while let Some(value) = writes.recv().await {
        let error = match store.put(value).await {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to persist timer value {}: {}", value, e);
                Some(e.to_string())
            }
        };

        if let Some(events) = events.upgrade() {
            let _ = events.send(Event::Persisted { error });
        }
    }

    debug!("Persistence writer task finished");
}
