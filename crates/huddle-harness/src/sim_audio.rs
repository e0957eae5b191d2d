//! Scripted audio levels.
//!
//! Each participant has a steady level (silent unless set) and an optional
//! queue of one-off peaks consumed before the steady level. Sources opened
//! from the meter read the shared script, so tests can change levels while
//! the detector runs.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use huddle_core::{
    session::ParticipantId,
    speaker::{AudioLevelSource, AudioMeter},
};

#[derive(Default)]
struct AudioState {
    levels: HashMap<ParticipantId, u8>,
    queued: HashMap<ParticipantId, VecDeque<u8>>,
    unavailable: HashSet<ParticipantId>,
    opened: usize,
    closed: usize,
    samples: usize,
}

/// Scripted [`AudioMeter`]. Clones share the script and counters.
#[derive(Clone, Default)]
pub struct SimAudioMeter {
    state: Arc<Mutex<AudioState>>,
}

impl SimAudioMeter {
    /// Meter where everyone is silent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the steady peak for `participant`.
    pub fn set_level(&self, participant: impl Into<ParticipantId>, peak: u8) {
        self.lock().levels.insert(participant.into(), peak);
    }

    /// Queue one-off peaks for `participant`, read before the steady level.
    pub fn queue(&self, participant: impl Into<ParticipantId>, peaks: &[u8]) {
        self.lock().queued.entry(participant.into()).or_default().extend(peaks);
    }

    /// Make `participant` have no audio; opening a source for them fails.
    pub fn make_unavailable(&self, participant: impl Into<ParticipantId>) {
        self.lock().unavailable.insert(participant.into());
    }

    /// Sources opened so far.
    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    /// Sources closed so far.
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    /// Sources currently open.
    pub fn open_sources(&self) -> usize {
        let state = self.lock();
        state.opened - state.closed
    }

    /// Samples taken across all sources.
    pub fn samples(&self) -> usize {
        self.lock().samples
    }

    fn lock(&self) -> MutexGuard<'_, AudioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioMeter for SimAudioMeter {
    fn open(&mut self, participant: &ParticipantId) -> Option<Box<dyn AudioLevelSource>> {
        let mut state = self.lock();
        if state.unavailable.contains(participant) {
            return None;
        }
        state.opened += 1;
        Some(Box::new(SimSource { participant: participant.clone(), meter: self.clone() }))
    }
}

struct SimSource {
    participant: ParticipantId,
    meter: SimAudioMeter,
}

impl AudioLevelSource for SimSource {
    fn sample_peak(&mut self) -> u8 {
        let mut state = self.meter.lock();
        state.samples += 1;
        let queued = state.queued.get_mut(&self.participant).and_then(VecDeque::pop_front);
        queued.or_else(|| state.levels.get(&self.participant).copied()).unwrap_or(0)
    }

    fn close(self: Box<Self>) {
        self.meter.lock().closed += 1;
    }
}
