//! Countdown driver: turns a duration into periodic tick events

use std::{collections::HashMap, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, trace};

/// Identifies one started countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverHandle(pub u64);

/// Events emitted by a running countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    Tick { handle: DriverHandle, remaining_ms: i64 },
    Finished { handle: DriverHandle },
}

impl DriverEvent {
    pub fn handle(&self) -> DriverHandle {
        match self {
            DriverEvent::Tick { handle, .. } | DriverEvent::Finished { handle } => *handle,
        }
    }
}

pub type DriverEventSender = mpsc::UnboundedSender<DriverEvent>;

/// Something that can count a duration down and report progress.
///
/// Implementations emit a `Tick` roughly every tick period and a single
/// `Finished` once the duration has elapsed. After `cancel` returns, no new
/// events are produced for that handle, though events already queued may
/// still be delivered.
pub trait CountdownDriver: Send + 'static {
    fn start(&mut self, duration_ms: i64, events: DriverEventSender) -> DriverHandle;

    fn cancel(&mut self, handle: DriverHandle);
}

/// Driver backed by one tokio task per countdown
#[derive(Debug)]
pub struct TokioDriver {
    tick: Duration,
    next_id: u64,
    tasks: HashMap<DriverHandle, JoinHandle<()>>,
}

impl TokioDriver {
    /// Create a driver ticking every `tick` (clamped to at least 1ms)
    pub fn new(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    /// Number of countdown tasks that have not finished yet
    pub fn live_tasks(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }
}

impl CountdownDriver for TokioDriver {
    fn start(&mut self, duration_ms: i64, events: DriverEventSender) -> DriverHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let handle = DriverHandle(self.next_id);
        let duration = Duration::from_millis(duration_ms.max(0) as u64);
        let tick = self.tick;

        debug!("Starting countdown {:?} for {}ms", handle, duration_ms);
        let task = tokio::spawn(async move {
            run_countdown(handle, duration, tick, events).await;
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: DriverHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            debug!("Cancelling countdown {:?}", handle);
            task.abort();
        }
    }
}

impl Drop for TokioDriver {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

async fn run_countdown(
    handle: DriverHandle,
    duration: Duration,
    tick: Duration,
    events: DriverEventSender,
) {
    let start = Instant::now();
    let deadline = start + duration;
    let mut next = start;

    loop {
        sleep_until(next).await;

        let now = Instant::now();
        if now >= deadline {
            let _ = events.send(DriverEvent::Finished { handle });
            break;
        }

        let remaining_ms = (deadline - now).as_millis() as i64;
        trace!("Countdown {:?} tick: {}ms left", handle, remaining_ms);
        if events.send(DriverEvent::Tick { handle, remaining_ms }).is_err() {
            // Nobody is listening anymore
            break;
        }

        // Steps are anchored to the start so ticks do not drift
        next = (next + tick).min(deadline);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DriverCommand {
        Start(DriverHandle, i64),
        Cancel(DriverHandle),
    }

    #[derive(Debug, Default)]
    struct Recorded {
        next_id: u64,
        commands: Vec<DriverCommand>,
        senders: HashMap<DriverHandle, DriverEventSender>,
    }

    /// Driver that never ticks on its own; tests emit events by hand
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDriver {
        inner: Arc<Mutex<Recorded>>,
    }

    impl RecordingDriver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn commands(&self) -> Vec<DriverCommand> {
            self.inner.lock().unwrap().commands.clone()
        }

        /// Handles that were started and not cancelled
        pub fn active(&self) -> Vec<DriverHandle> {
            let inner = self.inner.lock().unwrap();
            let mut active = Vec::new();
            for command in &inner.commands {
                match command {
                    DriverCommand::Start(handle, _) => active.push(*handle),
                    DriverCommand::Cancel(handle) => active.retain(|h| h != handle),
                }
            }
            active
        }

        pub fn last_started(&self) -> Option<(DriverHandle, i64)> {
            self.inner
                .lock()
                .unwrap()
                .commands
                .iter()
                .rev()
                .find_map(|command| match command {
                    DriverCommand::Start(handle, ms) => Some((*handle, *ms)),
                    DriverCommand::Cancel(_) => None,
                })
        }

        pub fn emit(&self, event: DriverEvent) {
            let inner = self.inner.lock().unwrap();
            if let Some(sender) = inner.senders.get(&event.handle()) {
                let _ = sender.send(event);
            }
        }
    }

    impl CountdownDriver for RecordingDriver {
        fn start(&mut self, duration_ms: i64, events: DriverEventSender) -> DriverHandle {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let handle = DriverHandle(inner.next_id);
            inner.commands.push(DriverCommand::Start(handle, duration_ms));
            inner.senders.insert(handle, events);
            handle
        }

        fn cancel(&mut self, handle: DriverHandle) {
            self.inner.lock().unwrap().commands.push(DriverCommand::Cancel(handle));
        }
    }
}
