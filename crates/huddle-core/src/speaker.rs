//! Active-speaker detection.
//!
//! One sampling pipeline per remote participant reads a peak audio level at a
//! fixed cadence. Any sample above the threshold makes that participant the
//! active speaker, clearing everyone else in the same store update. There is
//! no hysteresis: the last sample above the threshold wins.
//!
//! Pipelines own their audio source. They are all closed and rebuilt when the
//! roster changes, and closed on teardown or drop.

use std::{fmt, time::Duration};

use crate::{
    env::Moment,
    session::{ParticipantId, SessionStore},
};

/// Time between two samples of the same participant.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

/// Peak level (0-255) a sample must exceed to count as speech.
pub const DEFAULT_SPEAKING_THRESHOLD: u8 = 50;

/// Sampling cadence and threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerConfig {
    /// Time between samples of one participant
    pub sample_interval: Duration,
    /// A peak strictly above this marks the participant as speaking
    pub speaking_threshold: u8,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            speaking_threshold: DEFAULT_SPEAKING_THRESHOLD,
        }
    }
}

/// Audio level source for a single participant.
pub trait AudioLevelSource: Send {
    /// Peak of the current frequency-domain frame on a 0-255 scale.
    fn sample_peak(&mut self) -> u8;

    /// Release the underlying audio resource.
    ///
    /// Consumes the source, so it can only ever be closed once.
    fn close(self: Box<Self>);
}

/// Opens audio level sources for participants.
pub trait AudioMeter: Send {
    /// Open a source for `participant`.
    ///
    /// Returns `None` if the participant has no audio available; that
    /// participant is then skipped.
    fn open(&mut self, participant: &ParticipantId) -> Option<Box<dyn AudioLevelSource>>;
}

struct Pipeline<I> {
    participant: ParticipantId,
    source: Box<dyn AudioLevelSource>,
    next_sample: I,
}

/// Active-speaker detector.
pub struct SpeakerDetector<I> {
    config: SpeakerConfig,
    pipelines: Vec<Pipeline<I>>,
    /// Roster version the pipelines were built for. `None` when torn down.
    built_for: Option<u64>,
}

impl<I: Moment> SpeakerDetector<I> {
    /// Create a detector with no pipelines.
    pub fn new(config: SpeakerConfig) -> Self {
        Self { config, pipelines: Vec::new(), built_for: None }
    }

    /// Rebuild pipelines if the roster changed since the last build.
    ///
    /// Every existing pipeline is closed before the new ones are opened.
    /// Returns `true` if a rebuild happened.
    pub fn sync_roster(&mut self, store: &SessionStore, meter: &mut dyn AudioMeter, now: I) -> bool {
        if self.built_for == Some(store.roster_version()) {
            return false;
        }
        self.teardown();

        let first_sample = now + self.config.sample_interval;
        for participant in store.participants().iter().filter(|p| !p.is_local()) {
            match meter.open(&participant.id) {
                Some(source) => self.pipelines.push(Pipeline {
                    participant: participant.id.clone(),
                    source,
                    next_sample: first_sample,
                }),
                None => tracing::debug!(id = %participant.id, "no audio source, skipping"),
            }
        }
        self.built_for = Some(store.roster_version());

        tracing::debug!(
            pipelines = self.pipelines.len(),
            roster_version = store.roster_version(),
            "speaker pipelines rebuilt"
        );
        true
    }

    /// Take every sample that is due at `now`.
    ///
    /// Pipelines are sampled in roster order, so when several cross the
    /// threshold in one poll the later one wins. A pipeline that fell behind
    /// takes a single sample and resumes its cadence from `now`.
    ///
    /// Returns the number of samples taken.
    pub fn poll(&mut self, store: &mut SessionStore, now: I) -> usize {
        let mut taken = 0;
        for index in 0..self.pipelines.len() {
            let pipeline = &mut self.pipelines[index];
            if pipeline.next_sample > now {
                continue;
            }
            let peak = pipeline.source.sample_peak();
            pipeline.next_sample = pipeline.next_sample + self.config.sample_interval;
            if pipeline.next_sample <= now {
                pipeline.next_sample = now + self.config.sample_interval;
            }
            let participant = pipeline.participant.clone();

            self.record_sample(store, &participant, peak);
            taken += 1;
        }
        taken
    }

    /// Apply one sample. Returns `true` if it made `participant` active.
    pub fn record_sample(&self, store: &mut SessionStore, participant: &ParticipantId, peak: u8) -> bool {
        if peak <= self.config.speaking_threshold {
            return false;
        }
        match store.set_active_speaker(Some(participant)) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%participant, "dropping speaker sample: {e}");
                false
            },
        }
    }

    /// Close every pipeline.
    pub fn teardown(&mut self) {
        for pipeline in self.pipelines.drain(..) {
            pipeline.source.close();
        }
        self.built_for = None;
    }

    /// Earliest pending sample, if any pipeline is running.
    pub fn next_deadline(&self) -> Option<I> {
        self.pipelines.iter().map(|p| p.next_sample).min()
    }

    /// Number of open pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}

impl<I> Drop for SpeakerDetector<I> {
    fn drop(&mut self) {
        for pipeline in self.pipelines.drain(..) {
            pipeline.source.close();
        }
    }
}

impl<I> fmt::Debug for SpeakerDetector<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeakerDetector")
            .field("config", &self.config)
            .field("pipelines", &self.pipelines.len())
            .field("built_for", &self.built_for)
            .finish()
    }
}
