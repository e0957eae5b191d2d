//! Scripted media devices.
//!
//! [`SimMediaDevices`] grants camera and screen requests by default. Tests
//! can deny the next request, hold it until released, or end a live screen
//! share from the "platform" side. Every track created is recorded in a
//! [`TrackLedger`], so leaks show up as tracks that were started but never
//! stopped.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::{FutureExt, channel::oneshot};
use huddle_core::{
    MediaError,
    media::{Acquisition, MediaDevices, MediaKind, MediaStream, MediaTrack, StreamId, TrackEnd},
};

/// Counts of tracks started and stopped, per kind.
#[derive(Debug, Default)]
pub struct TrackLedger {
    camera_started: AtomicUsize,
    camera_stopped: AtomicUsize,
    screen_started: AtomicUsize,
    screen_stopped: AtomicUsize,
}

impl TrackLedger {
    fn counters(&self, kind: MediaKind) -> (&AtomicUsize, &AtomicUsize) {
        match kind {
            MediaKind::Camera => (&self.camera_started, &self.camera_stopped),
            MediaKind::Screen => (&self.screen_started, &self.screen_stopped),
        }
    }

    /// Tracks of `kind` ever started.
    pub fn started(&self, kind: MediaKind) -> usize {
        self.counters(kind).0.load(Ordering::SeqCst)
    }

    /// Tracks of `kind` stopped.
    pub fn stopped(&self, kind: MediaKind) -> usize {
        self.counters(kind).1.load(Ordering::SeqCst)
    }

    /// Tracks of `kind` still running.
    pub fn running(&self, kind: MediaKind) -> usize {
        self.started(kind) - self.stopped(kind)
    }

    /// Tracks of any kind still running.
    pub fn total_running(&self) -> usize {
        self.running(MediaKind::Camera) + self.running(MediaKind::Screen)
    }
}

/// What the next request of a kind does.
enum Outcome {
    Deny(String),
    Hold(oneshot::Receiver<()>),
}

type EndSender = Arc<Mutex<Option<oneshot::Sender<TrackEnd>>>>;

struct DeviceState {
    screen_supported: bool,
    next_stream: StreamId,
    scripted: HashMap<MediaKind, VecDeque<Outcome>>,
    gates: Vec<oneshot::Sender<()>>,
    /// Ended-signal senders of screen streams, by stream id.
    screen_ends: HashMap<StreamId, EndSender>,
    requests: usize,
}

/// Scripted camera and screen capture. Clones share state.
#[derive(Clone)]
pub struct SimMediaDevices {
    state: Arc<Mutex<DeviceState>>,
    ledger: Arc<TrackLedger>,
}

impl Default for SimMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl SimMediaDevices {
    /// Devices that grant every request and support screen capture.
    pub fn new() -> Self {
        let state = DeviceState {
            screen_supported: true,
            next_stream: 0,
            scripted: HashMap::new(),
            gates: Vec::new(),
            screen_ends: HashMap::new(),
            requests: 0,
        };
        Self { state: Arc::new(Mutex::new(state)), ledger: Arc::new(TrackLedger::default()) }
    }

    /// Report no screen-capture support.
    #[must_use]
    pub fn without_screen_capture(self) -> Self {
        self.lock().screen_supported = false;
        self
    }

    /// Shared track ledger.
    pub fn ledger(&self) -> Arc<TrackLedger> {
        Arc::clone(&self.ledger)
    }

    /// Deny the next request of `kind`.
    pub fn deny_next(&self, kind: MediaKind) {
        self.lock()
            .scripted
            .entry(kind)
            .or_default()
            .push_back(Outcome::Deny("Permission denied".into()));
    }

    /// Hold the next request of `kind` until [`Self::release_held`].
    pub fn hold_next(&self, kind: MediaKind) {
        let (tx, rx) = oneshot::channel();
        let mut state = self.lock();
        state.gates.push(tx);
        state.scripted.entry(kind).or_default().push_back(Outcome::Hold(rx));
    }

    /// Let every held request complete. Returns how many were waiting.
    pub fn release_held(&self) -> usize {
        let gates = std::mem::take(&mut self.lock().gates);
        let count = gates.len();
        for gate in gates {
            // A dropped request has nothing to release.
            let _ = gate.send(());
        }
        count
    }

    /// End a live screen share from the platform side.
    ///
    /// Returns `false` if there is no screen stream whose signal is still
    /// pending.
    pub fn end_screen_share(&self) -> bool {
        let ends: Vec<EndSender> = self.lock().screen_ends.drain().map(|(_, end)| end).collect();
        let mut ended = false;
        for end in ends {
            if let Some(tx) = lock(&end).take() {
                ended |= tx.send(TrackEnd::External).is_ok();
            }
        }
        ended
    }

    /// Number of acquisitions requested so far.
    pub fn requests(&self) -> usize {
        self.lock().requests
    }

    /// Build a granted stream directly, bypassing the request script.
    pub fn grant(&self, kind: MediaKind) -> MediaStream {
        let id = {
            let mut state = self.lock();
            state.next_stream += 1;
            state.next_stream
        };
        let end: EndSender = Arc::new(Mutex::new(None));
        let track: Box<dyn MediaTrack> =
            Box::new(SimTrack::start(kind, &self.ledger, Arc::clone(&end)));
        let stream = MediaStream::new(id, kind, vec![track]);

        if kind == MediaKind::Screen {
            let (tx, rx) = oneshot::channel();
            *lock(&end) = Some(tx);
            self.lock().screen_ends.insert(id, end);
            stream.with_ended_signal(rx.map(|r| r.unwrap_or(TrackEnd::Released)).boxed())
        } else {
            stream
        }
    }

    fn acquire(&self, kind: MediaKind) -> Acquisition {
        let outcome = {
            let mut state = self.lock();
            state.requests += 1;
            state.scripted.get_mut(&kind).and_then(VecDeque::pop_front)
        };
        let devices = self.clone();

        match outcome {
            // Tracks start when the request is polled, not when it is made.
            None => async move { Ok::<_, MediaError>(devices.grant(kind)) }.boxed(),
            Some(Outcome::Deny(reason)) => {
                std::future::ready(Err(MediaError::AccessDenied { kind, reason })).boxed()
            },
            Some(Outcome::Hold(gate)) => async move {
                // A dropped gate still releases the request.
                let _ = gate.await;
                Ok::<_, MediaError>(devices.grant(kind))
            }
            .boxed(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        lock(&self.state)
    }
}

impl MediaDevices for SimMediaDevices {
    fn supports_screen_capture(&self) -> bool {
        self.lock().screen_supported
    }

    fn request_camera(&self) -> Acquisition {
        self.acquire(MediaKind::Camera)
    }

    fn request_screen_capture(&self) -> Acquisition {
        self.acquire(MediaKind::Screen)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SimTrack {
    kind: MediaKind,
    ledger: Arc<TrackLedger>,
    end: EndSender,
}

impl SimTrack {
    fn start(kind: MediaKind, ledger: &Arc<TrackLedger>, end: EndSender) -> Self {
        ledger.counters(kind).0.fetch_add(1, Ordering::SeqCst);
        Self { kind, ledger: Arc::clone(ledger), end }
    }
}

impl MediaTrack for SimTrack {
    fn label(&self) -> &str {
        match self.kind {
            MediaKind::Camera => "sim camera",
            MediaKind::Screen => "sim screen",
        }
    }

    fn stop(self: Box<Self>) {
        self.ledger.counters(self.kind).1.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = lock(&self.end).take() {
            let _ = tx.send(TrackEnd::Released);
        }
    }
}
