//! Store subscription forwarding

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::state_machine::Event;

/// Background task that queues every value the store emits as a refresh event,
/// so store updates are applied in the same sequence as intents
pub async fn store_sync_task(
    mut values: watch::Receiver<i64>,
    events: mpsc::WeakUnboundedSender<Event>,
) {
    while values.changed().await.is_ok() {
        let Some(events) = events.upgrade() else {
            break;
        };

        // The store cannot publish a newer value until the borrow is released,
        // so a value is always queued before the write that replaces it reports
        // completion
        let sent = {
            let value = values.borrow_and_update();
            events.send(Event::StoreRefresh(*value))
        };
        if sent.is_err() {
            break;
        }
    }

    debug!("Store sync task finished");
}
