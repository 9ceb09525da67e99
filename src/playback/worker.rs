use std::{
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use super::{PlayerBackend, PollEvent, TrackChangeDetector, TransportAction};
use crate::error::Result;

/// A fetch that hasn't answered in this long is considered lost.
const STALE_FETCH: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    Fetch,
    Transport(TransportAction),
    Shutdown,
}

/// Handle to the thread that talks to the player.
///
/// Fetches are never overlapped: a new one is only requested once the previous
/// answer was drained (or went stale). Dropping the handle stops the thread.
pub struct PlaybackWorker {
    request_tx: Option<Sender<WorkerCommand>>,
    event_rx: Option<Receiver<PollEvent>>,
    interval: Duration,
    inflight_since: Option<Instant>,
    last_pull: Option<Instant>,
}

impl PlaybackWorker {
    /// Spawns the worker; `open` runs on the worker thread to create the backend.
    pub fn spawn<F>(interval: Duration, open: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn PlayerBackend>> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("playback-poll".to_string())
            .spawn(move || match open() {
                Ok(backend) => run(backend, request_rx, event_tx),
                Err(err) => {
                    let _ = event_tx.send(PollEvent::FetchFailed(err));
                }
            })
            .map(|_| ())
            .unwrap_or_else(|err| warn!(%err, "failed to spawn playback worker"));

        Self {
            request_tx: Some(request_tx),
            event_rx: Some(event_rx),
            interval,
            inflight_since: None,
            last_pull: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_alive(&self) -> bool {
        self.request_tx.is_some()
    }

    /// Issues a fetch if the interval elapsed and no fetch is outstanding.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(sent_at) = self.inflight_since {
            if now.duration_since(sent_at) <= STALE_FETCH {
                return false;
            }
            debug!("previous fetch went stale, polling again");
            self.inflight_since = None;
        }

        if let Some(last) = self.last_pull {
            if now.duration_since(last) < self.interval {
                return false;
            }
        }

        if self.send(WorkerCommand::Fetch) {
            self.inflight_since = Some(now);
            self.last_pull = Some(now);
            true
        } else {
            false
        }
    }

    pub fn transport(&mut self, action: TransportAction) {
        if !self.send(WorkerCommand::Transport(action)) {
            warn!(%action, "playback worker is gone, dropping command");
        }
    }

    /// Collects every event the worker produced since the last call.
    pub fn drain(&mut self) -> Vec<PollEvent> {
        let mut events = Vec::new();
        let Some(rx) = self.event_rx.as_ref() else {
            return events;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.inflight_since = None;
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.event_rx = None;
                    self.request_tx = None;
                    self.inflight_since = None;
                    break;
                }
            }
        }

        events
    }

    /// Time until the next fetch is due, for scheduling repaints.
    pub fn until_next_tick(&self, now: Instant) -> Duration {
        match self.last_pull {
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }

    fn send(&mut self, command: WorkerCommand) -> bool {
        let Some(tx) = self.request_tx.as_ref() else {
            return false;
        };
        if tx.send(command).is_ok() {
            true
        } else {
            self.request_tx = None;
            false
        }
    }
}

impl Drop for PlaybackWorker {
    fn drop(&mut self) {
        if let Some(tx) = self.request_tx.take() {
            let _ = tx.send(WorkerCommand::Shutdown);
        }
    }
}

fn run(
    mut backend: Box<dyn PlayerBackend>,
    requests: Receiver<WorkerCommand>,
    events: Sender<PollEvent>,
) {
    let mut detector = TrackChangeDetector::default();

    while let Ok(command) = requests.recv() {
        match command {
            WorkerCommand::Fetch => {
                let event = match backend.fetch() {
                    Ok(snapshot) => {
                        let transitioned = detector.observe(&snapshot.track_name);
                        PollEvent::Snapshot {
                            snapshot,
                            transitioned,
                        }
                    }
                    Err(err) => PollEvent::FetchFailed(err),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            WorkerCommand::Transport(action) => {
                if let Err(err) = backend.send(action) {
                    warn!(%err, "transport command failed");
                }
            }
            WorkerCommand::Shutdown => break,
        }
    }

    debug!("playback worker stopped");
}
