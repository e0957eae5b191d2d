//! Mocked capture devices and audio levels for the console binary.
//!
//! There is no real camera here. [`MockMediaDevices`] hands out streams
//! after a configurable latency and [`MockAudioMeter`] produces seeded
//! random peaks, so a session looks alive without any hardware.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::{FutureExt, channel::oneshot};
use huddle_core::{
    MediaError,
    media::{Acquisition, MediaDevices, MediaKind, MediaStream, MediaTrack, StreamId, TrackEnd},
    session::ParticipantId,
    speaker::{AudioLevelSource, AudioMeter},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

type EndSender = Arc<Mutex<Option<oneshot::Sender<TrackEnd>>>>;

#[derive(Default)]
struct DeviceState {
    next_stream: StreamId,
    screen_ends: HashMap<StreamId, EndSender>,
}

/// Camera and screen capture that grant (or deny) after a delay.
#[derive(Clone)]
pub struct MockMediaDevices {
    latency: Duration,
    deny_camera: bool,
    screen_supported: bool,
    state: Arc<Mutex<DeviceState>>,
}

impl MockMediaDevices {
    /// Devices that answer every request after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            deny_camera: false,
            screen_supported: true,
            state: Arc::new(Mutex::new(DeviceState::default())),
        }
    }

    /// Deny every camera request, as if the user refused permission.
    #[must_use]
    pub fn deny_camera(mut self, deny: bool) -> Self {
        self.deny_camera = deny;
        self
    }

    /// Report whether screen capture exists on this "platform".
    #[must_use]
    pub fn screen_supported(mut self, supported: bool) -> Self {
        self.screen_supported = supported;
        self
    }

    /// End every live screen share, like the browser's "stop sharing" bar.
    ///
    /// Returns `false` if nothing was being shared.
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

    fn grant(&self, kind: MediaKind) -> MediaStream {
        let mut state = self.lock();
        state.next_stream += 1;
        let id = state.next_stream;

        let end: EndSender = Arc::new(Mutex::new(None));
        let track: Box<dyn MediaTrack> = Box::new(MockTrack { kind, stream: id, end: Arc::clone(&end) });
        let stream = MediaStream::new(id, kind, vec![track]);
        tracing::debug!(stream = id, %kind, "track started");

        if kind == MediaKind::Screen {
            let (tx, rx) = oneshot::channel();
            *lock(&end) = Some(tx);
            state.screen_ends.insert(id, end);
            stream.with_ended_signal(rx.map(|r| r.unwrap_or(TrackEnd::Released)).boxed())
        } else {
            stream
        }
    }

    fn acquire(&self, kind: MediaKind) -> Acquisition {
        let devices = self.clone();
        async move {
            tokio::time::sleep(devices.latency).await;
            if kind == MediaKind::Camera && devices.deny_camera {
                return Err(MediaError::AccessDenied { kind, reason: "Permission denied".into() });
            }
            Ok::<_, MediaError>(devices.grant(kind))
        }
        .boxed()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        lock(&self.state)
    }
}

impl MediaDevices for MockMediaDevices {
    fn supports_screen_capture(&self) -> bool {
        self.screen_supported
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

struct MockTrack {
    kind: MediaKind,
    stream: StreamId,
    end: EndSender,
}

impl MediaTrack for MockTrack {
    fn label(&self) -> &str {
        match self.kind {
            MediaKind::Camera => "mock camera",
            MediaKind::Screen => "mock screen",
        }
    }

    fn stop(self: Box<Self>) {
        tracing::debug!(stream = self.stream, kind = %self.kind, "track stopped");
        if let Some(tx) = lock(&self.end).take() {
            let _ = tx.send(TrackEnd::Released);
        }
    }
}

/// Random audio levels.
///
/// Each sample is loud (above the default threshold of 50) with probability
/// `activity`, otherwise quiet. Sources are seeded from the meter's seed, so
/// a run is reproducible for a given seed and roster.
pub struct MockAudioMeter {
    rng: StdRng,
    activity: f64,
}

impl MockAudioMeter {
    /// Meter producing loud samples with probability `activity`, clamped to
    /// `[0, 1]`.
    pub fn new(seed: u64, activity: f64) -> Self {
        let activity = if activity.is_nan() { 0.0 } else { activity.clamp(0.0, 1.0) };
        Self { rng: StdRng::seed_from_u64(seed), activity }
    }
}

impl AudioMeter for MockAudioMeter {
    fn open(&mut self, participant: &ParticipantId) -> Option<Box<dyn AudioLevelSource>> {
        tracing::trace!(participant = %participant, "audio source opened");
        Some(Box::new(MockSource {
            rng: StdRng::seed_from_u64(self.rng.random()),
            activity: self.activity,
        }))
    }
}

struct MockSource {
    rng: StdRng,
    activity: f64,
}

impl AudioLevelSource for MockSource {
    fn sample_peak(&mut self) -> u8 {
        if self.rng.random_bool(self.activity) {
            self.rng.random_range(51..=255)
        } else {
            self.rng.random_range(0..=50)
        }
    }

    fn close(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn camera_is_granted_after_latency() {
        let devices = MockMediaDevices::new(Duration::from_millis(5));

        let stream = devices.request_camera().await.unwrap();

        assert_eq!(stream.kind(), MediaKind::Camera);
        assert_eq!(stream.track_count(), 1);
    }

    #[tokio::test]
    async fn denied_camera_reports_access_denied() {
        let devices = MockMediaDevices::new(Duration::ZERO).deny_camera(true);

        let result = devices.request_camera().await;

        assert!(matches!(result, Err(MediaError::AccessDenied { kind: MediaKind::Camera, .. })));
        assert!(devices.request_screen_capture().await.is_ok());
    }

    #[tokio::test]
    async fn ending_share_fires_external_signal() {
        let devices = MockMediaDevices::new(Duration::ZERO);
        let mut stream = devices.request_screen_capture().await.unwrap();
        let signal = stream.take_ended_signal().unwrap();

        assert!(devices.end_screen_share());

        assert_eq!(signal.await, TrackEnd::External);
        assert!(!devices.end_screen_share());
    }

    #[tokio::test]
    async fn stream_ids_are_unique() {
        let devices = MockMediaDevices::new(Duration::ZERO);

        let a = devices.request_camera().await.unwrap();
        let b = devices.request_screen_capture().await.unwrap();

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn silent_meter_stays_below_threshold() {
        let mut meter = MockAudioMeter::new(7, 0.0);
        let mut source = meter.open(&"2".into()).unwrap();

        assert!((0..200).all(|_| source.sample_peak() <= 50));
    }

    #[test]
    fn always_active_meter_is_loud() {
        let mut meter = MockAudioMeter::new(7, 1.0);
        let mut source = meter.open(&"2".into()).unwrap();

        assert!((0..200).all(|_| source.sample_peak() > 50));
    }

    #[test]
    fn same_seed_gives_same_levels() {
        let sample = |seed| {
            let mut meter = MockAudioMeter::new(seed, 0.5);
            let mut source = meter.open(&"3".into()).unwrap();
            (0..16).map(|_| source.sample_peak()).collect::<Vec<_>>()
        };

        assert_eq!(sample(42), sample(42));
    }
}
