//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` plays a script of steps against the production
//! [`huddle_app::Runtime`]: events to deliver, virtual time to pass, and
//! hooks that poke the simulated devices. Every render is recorded and,
//! when a registry is attached, checked against the session invariants.
//! When the script runs out the driver delivers [`AppEvent::Quit`].

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use huddle_app::{AppEvent, CallPhase, Driver};
use huddle_core::session::SessionStore;

use crate::{InvariantRegistry, SessionSnapshot, SimEnv, TrackLedger, invariants::Violation};

/// Error type for simulation driver.
#[derive(Debug, thiserror::Error)]
pub enum SimDriverError {
    /// A render broke at least one invariant.
    #[error("invariant violation after render {render}: {}", format_violations(.violations))]
    Invariant {
        /// Index of the offending render.
        render: usize,
        /// Every violation found.
        violations: Vec<Violation>,
    },
}

fn format_violations(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

type Hook = Box<dyn FnOnce() + Send>;

enum Step {
    Event(AppEvent),
    Advance(Duration),
    Idle,
    Hook(Hook),
}

/// One recorded render.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Call phase at render time.
    pub phase: CallPhase,
    /// Session snapshot at render time.
    pub session: SessionStore,
}

/// Shared, cloneable view of every render the driver performed.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    frames: Arc<Mutex<Vec<RenderedFrame>>>,
}

impl RenderLog {
    /// Number of renders so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Most recent render.
    pub fn last(&self) -> Option<RenderedFrame> {
        self.lock().last().cloned()
    }

    /// Every render in order.
    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.lock().clone()
    }

    fn push(&self, frame: RenderedFrame) -> usize {
        let mut frames = self.lock();
        frames.push(frame);
        frames.len() - 1
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RenderedFrame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the same [`huddle_app::Runtime`] orchestration
/// code runs in both the console binary and simulation tests.
pub struct SimDriver {
    env: SimEnv,
    script: VecDeque<Step>,
    renders: RenderLog,
    invariants: Option<InvariantRegistry>,
    ledger: Option<Arc<TrackLedger>>,
    stopped: Arc<AtomicBool>,
}

impl SimDriver {
    /// Create a driver advancing `env` with an empty script.
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            script: VecDeque::new(),
            renders: RenderLog::default(),
            invariants: None,
            ledger: None,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enable invariant checking on every render.
    ///
    /// With a ledger, running tracks are checked against the media flags.
    #[must_use]
    pub fn with_invariants(
        mut self,
        registry: InvariantRegistry,
        ledger: Option<Arc<TrackLedger>>,
    ) -> Self {
        self.invariants = Some(registry);
        self.ledger = ledger;
        self
    }

    /// Deliver `event`.
    #[must_use]
    pub fn event(mut self, event: AppEvent) -> Self {
        self.script.push_back(Step::Event(event));
        self
    }

    /// Advance the virtual clock without input.
    #[must_use]
    pub fn advance(mut self, by: Duration) -> Self {
        self.script.push_back(Step::Advance(by));
        self
    }

    /// Sleep until the app's next deadline, so due timers fire on the
    /// following tick.
    #[must_use]
    pub fn idle(mut self) -> Self {
        self.script.push_back(Step::Idle);
        self
    }

    /// Idle through `count` deadlines.
    #[must_use]
    pub fn idle_for(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.script.push_back(Step::Idle);
        }
        self
    }

    /// Run `hook` between cycles, e.g. to release held acquisitions.
    #[must_use]
    pub fn hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.script.push_back(Step::Hook(Box::new(hook)));
        self
    }

    /// Handle to the render log. Stays valid after the runtime consumes the
    /// driver.
    pub fn renders(&self) -> RenderLog {
        self.renders.clone()
    }

    /// Flag set once the runtime stops the driver.
    pub fn stopped_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self, wait: Option<Duration>) -> Result<Option<AppEvent>, Self::Error> {
        match self.script.pop_front() {
            Some(Step::Event(event)) => Ok(Some(event)),
            Some(Step::Advance(by)) => {
                self.env.advance(by);
                Ok(None)
            },
            Some(Step::Idle) => {
                if let Some(wait) = wait {
                    self.env.advance(wait);
                }
                Ok(None)
            },
            Some(Step::Hook(hook)) => {
                hook();
                Ok(None)
            },
            None => Ok(Some(AppEvent::Quit)),
        }
    }

    fn render(&mut self, phase: CallPhase, session: &SessionStore) -> Result<(), Self::Error> {
        let render = self.renders.push(RenderedFrame { phase, session: session.clone() });
        tracing::trace!(render, ?phase, "sim render");

        if let Some(registry) = &self.invariants {
            let mut snapshot = SessionSnapshot::capture(session);
            if let Some(ledger) = &self.ledger {
                snapshot = snapshot.with_ledger(ledger);
            }
            registry.check_all(&snapshot).map_err(|violations| {
                tracing::warn!(render, count = violations.len(), "invariant violated");
                SimDriverError::Invariant { render, violations }
            })?;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
