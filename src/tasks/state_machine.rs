//! Timer state machine task
//!
//! The machine owns the `TimerState` and is the only code that replaces it.
//! Intents, store refreshes and persistence failures arrive on one mailbox
//! and are handled one at a time; driver events are translated into intents
//! on the same loop.

use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::{persistence_writer::persistence_writer_task, store_sync::store_sync_task};
use crate::{
    services::{CountdownDriver, DriverEvent, DriverEventSender, DriverHandle, ValueStore},
    state::{reduce, refresh, Effect, TimerIntent, TimerState, Transition},
};

/// Everything the machine can be asked to process
#[derive(Debug)]
pub enum Event {
    Intent {
        intent: TimerIntent,
        reply: Option<oneshot::Sender<TimerState>>,
    },
    /// A value emitted by the store subscription
    StoreRefresh(i64),
    /// The writer finished one queued write, with the error if it failed
    Persisted { error: Option<String> },
}

/// Cloneable handle used to feed intents to a running machine and observe
/// its state. The machine stops once every handle is dropped, after writing
/// out everything it queued for the store.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    events_tx: mpsc::UnboundedSender<Event>,
    state_rx: watch::Receiver<TimerState>,
}

impl TimerHandle {
    /// Queue an intent without waiting for it to be applied
    pub fn send(&self, intent: TimerIntent) -> Result<(), String> {
        self.events_tx
            .send(Event::Intent { intent, reply: None })
            .map_err(|_| "Timer state machine is not running".to_string())
    }

    /// Queue an intent and wait for the state it produced
    pub async fn dispatch(&self, intent: TimerIntent) -> Result<TimerState, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.events_tx
            .send(Event::Intent {
                intent,
                reply: Some(reply_tx),
            })
            .map_err(|_| "Timer state machine is not running".to_string())?;

        reply_rx
            .await
            .map_err(|e| format!("Timer state machine dropped the intent: {}", e))
    }

    /// Latest published state
    pub fn state(&self) -> TimerState {
        self.state_rx.borrow().clone()
    }

    /// Watch every state the machine publishes
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_rx.clone()
    }
}

/// Start the state machine and its helper tasks.
///
/// The initial state is taken from the store's current value before any
/// intent can be processed.
pub fn spawn_timer<S, D>(store: Arc<S>, driver: D) -> TimerHandle
where
    S: ValueStore,
    D: CountdownDriver,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (driver_tx, driver_rx) = mpsc::unbounded_channel();
    let (persist_tx, persist_rx) = mpsc::unbounded_channel();

    let mut values = store.subscribe();
    let initial = refresh(&TimerState::new(), *values.borrow_and_update());
    let (state_tx, state_rx) = watch::channel(initial.clone());

    let writer = tokio::spawn(persistence_writer_task(
        Arc::clone(&store),
        persist_rx,
        events_tx.downgrade(),
    ));
    tokio::spawn(store_sync_task(values, events_tx.downgrade()));

    let machine = StateMachine {
        state: initial,
        driver,
        active: None,
        driver_tx,
        persist_tx,
        pending_writes: 0,
        writer,
        state_tx,
    };
    tokio::spawn(machine.run(events_rx, driver_rx));

    TimerHandle {
        events_tx,
        state_rx,
    }
}

struct StateMachine<D> {
    state: TimerState,
    driver: D,
    /// The only countdown allowed to be running
    active: Option<DriverHandle>,
    driver_tx: DriverEventSender,
    persist_tx: mpsc::UnboundedSender<i64>,
    /// Writes queued for the store that the writer has not finished yet.
    /// Store emissions seen while this is non-zero are echoes of older
    /// writes and would move the timer back in time.
    pending_writes: usize,
    writer: JoinHandle<()>,
    state_tx: watch::Sender<TimerState>,
}

impl<D: CountdownDriver> StateMachine<D> {
    async fn run(
        mut self,
        mut events_rx: mpsc::UnboundedReceiver<Event>,
        mut driver_rx: mpsc::UnboundedReceiver<DriverEvent>,
    ) {
        info!(
            "Starting timer state machine with {} remaining",
            self.state.formatted
        );

        loop {
            tokio::select! {
                biased;

                event = events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },

                Some(event) = driver_rx.recv() => self.handle_driver_event(event),
            }
        }

        self.cancel_active();

        // Flush queued writes before observers see the machine go away
        let Self {
            persist_tx,
            writer,
            state_tx,
            ..
        } = self;
        drop(persist_tx);
        if let Err(e) = writer.await {
            warn!("Persistence writer ended abnormally: {}", e);
        }
        drop(state_tx);

        info!("Timer state machine stopped");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Intent { intent, reply } => {
                self.apply(intent);
                if let Some(reply) = reply {
                    let _ = reply.send(self.state.clone());
                }
            }
            Event::StoreRefresh(value) => {
                if self.pending_writes > 0 {
                    debug!(
                        "Skipping store value {}ms, {} writes in flight",
                        value, self.pending_writes
                    );
                    return;
                }
                debug!("Store emitted {}ms", value);
                self.state = refresh(&self.state, value);
                self.publish();
            }
            Event::Persisted { error } => {
                self.pending_writes = self.pending_writes.saturating_sub(1);
                match error {
                    Some(message) => {
                        warn!("Timer state not persisted: {}", message);
                        self.state.store_error = Some(message);
                        self.publish();
                    }
                    None => {
                        if self.state.store_error.take().is_some() {
                            self.publish();
                        }
                    }
                }
            }
        }
    }

    fn handle_driver_event(&mut self, event: DriverEvent) {
        if self.active != Some(event.handle()) {
            debug!("Ignoring event from cancelled countdown {:?}", event.handle());
            return;
        }

        match event {
            DriverEvent::Tick { remaining_ms, .. } => {
                self.apply(TimerIntent::Tick { remaining_ms });
            }
            DriverEvent::Finished { .. } => {
                info!("Countdown finished");
                self.apply(TimerIntent::StopTimer);
            }
        }
    }

    fn apply(&mut self, intent: TimerIntent) {
        match &intent {
            TimerIntent::Tick { .. } => {}
            other => debug!("Applying intent: {:?}", other),
        }

        let Transition { state, effects } = reduce(&self.state, intent);
        let was_running = self.state.is_running;
        self.state = state;

        for effect in effects {
            self.run_effect(effect);
        }

        if was_running != self.state.is_running {
            info!(
                "Timer {} at {}",
                if self.state.is_running { "started" } else { "stopped" },
                self.state.formatted
            );
        }
        self.publish();
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Persist(value) => {
                match self.persist_tx.send(value) {
                    Ok(()) => self.pending_writes += 1,
                    Err(_) => warn!("Persistence writer is gone, dropping write of {}ms", value),
                }
            }
            Effect::CancelDriver => self.cancel_active(),
            Effect::StartDriver(duration_ms) => {
                if self.active.is_some() {
                    warn!("Starting a countdown while another is active, cancelling it first");
                    self.cancel_active();
                }
                let handle = self.driver.start(duration_ms, self.driver_tx.clone());
                self.active = Some(handle);
            }
        }
    }

    fn cancel_active(&mut self) {
        if let Some(handle) = self.active.take() {
            self.driver.cancel(handle);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
