//! Session invariants checked after every simulated step.
//!
//! A [`SessionSnapshot`] flattens what the renderer would see (plus the
//! device ledger's running track counts) and each [`Invariant`] inspects it.
//! Property tests and the simulation driver share the same registry, so a
//! rule added here is enforced everywhere.
//!
//! ```ignore
//! let snapshot = SessionSnapshot::capture(app.session()).with_ledger(&ledger);
//! InvariantRegistry::standard().check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    MessageIdsIncreasing, NoDanglingMedia, NoOrphanTracks, PinnedInRoster, SingleActiveSpeaker,
    WatermarkNotAhead, ZoomInRange,
};
pub use snapshot::{MessageSnapshot, ParticipantSnapshot, SessionSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Identifies an invariant in violation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// At most one active speaker.
    SingleActiveSpeaker,
    /// Pinned participant is in the roster.
    PinnedInRoster,
    /// Zoom within the display clamp.
    ZoomInRange,
    /// Message ids strictly increasing.
    MessageIdsIncreasing,
    /// Read watermark not ahead of the log.
    WatermarkNotAhead,
    /// No running tracks while the owning flag is off.
    NoOrphanTracks,
    /// Media flags and stream bindings backed by live streams.
    NoDanglingMedia,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleActiveSpeaker => "single_active_speaker",
            Self::PinnedInRoster => "pinned_in_roster",
            Self::ZoomInRange => "zoom_in_range",
            Self::MessageIdsIncreasing => "message_ids_increasing",
            Self::WatermarkNotAhead => "watermark_not_ahead",
            Self::NoOrphanTracks => "no_orphan_tracks",
            Self::NoDanglingMedia => "no_dangling_media",
        };
        f.write_str(name)
    }
}

/// A broken invariant and what was observed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{invariant}: {message}")]
pub struct Violation {
    /// The rule that failed.
    pub invariant: InvariantKind,
    /// Observed state, e.g. which ids were active.
    pub message: String,
}

/// A rule every session snapshot must satisfy.
pub trait Invariant: Send + Sync {
    /// Reported in violations.
    fn kind(&self) -> InvariantKind;

    /// Inspect one snapshot.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Ordered set of invariants run together.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Registry with no rules.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Every session rule, in [`InvariantKind`] order.
    pub fn standard() -> Self {
        Self::new()
            .with(SingleActiveSpeaker)
            .with(PinnedInRoster)
            .with(ZoomInRange)
            .with(MessageIdsIncreasing)
            .with(WatermarkNotAhead)
            .with(NoOrphanTracks)
            .with(NoDanglingMedia)
    }

    /// Append a rule.
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    /// Run every rule. Collects all failures rather than stopping at the first.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let failed: Vec<Violation> =
            self.invariants.iter().map(|rule| rule.check(state)).filter_map(Result::err).collect();
        if failed.is_empty() { Ok(()) } else { Err(failed) }
    }

    /// Rules registered.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// True when no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
