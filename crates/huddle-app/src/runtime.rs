//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: session state machine
//! - [`MediaDevices`]: capture capability
//! - [`Driver`]: platform-specific I/O
//!
//! Media acquisitions run as futures owned by the runtime. Their results
//! come back to the app as [`AppEvent::MediaAcquired`], so the app never
//! awaits and stale completions are resolved by ticket.

use std::time::Duration;

use futures::{FutureExt, StreamExt, future::BoxFuture, stream::FuturesUnordered};
use huddle_core::{
    Environment, SessionConfig,
    media::{AcquisitionTicket, MediaDevices, TrackEnd},
    speaker::AudioMeter,
};

use crate::{App, AppAction, AppEvent, Driver};

/// Work whose completion feeds back into the app. `None` completes silently.
type InFlight = BoxFuture<'static, Option<AppEvent>>;

/// Generic runtime that orchestrates App, media devices and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment supplying time
/// - `M`: Media capture capability
pub struct Runtime<D, E, M>
where
    D: Driver,
    E: Environment,
    M: MediaDevices,
{
    driver: D,
    app: App<E>,
    devices: M,
    in_flight: FuturesUnordered<InFlight>,
}

impl<D, E, M> Runtime<D, E, M>
where
    D: Driver,
    E: Environment,
    M: MediaDevices,
{
    /// Create a runtime and start the session.
    ///
    /// Screen capture support is probed here, once.
    pub fn new(
        driver: D,
        env: E,
        devices: M,
        meter: Box<dyn AudioMeter>,
        config: SessionConfig,
    ) -> Self {
        let supported = devices.supports_screen_capture();
        let app = App::new(env, config, meter, supported);
        Self { driver, app, devices, in_flight: FuturesUnordered::new() }
    }

    /// Run the main event loop.
    ///
    /// This is the core orchestration loop that:
    /// 1. Waits for input until the app's next deadline
    /// 2. Feeds completed acquisitions and ended streams back to the app
    /// 3. Ticks the app so due timers fire
    ///
    /// On exit, error or not, the session is torn down and every pending
    /// acquisition is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.event_loop().await;
        self.shutdown();
        result
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        self.driver.render(self.app.phase(), self.app.session())?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                return Ok(());
            }
        }
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let wait = self.app.next_deadline().map(|deadline| {
            let now = self.app.env().now();
            if deadline > now { deadline - now } else { Duration::ZERO }
        });

        if let Some(event) = self.driver.poll_event(wait).await?
            && self.dispatch(event)?
        {
            return Ok(true);
        }

        while let Some(Some(completed)) = self.in_flight.next().now_or_never() {
            if let Some(event) = completed
                && self.dispatch(event)?
            {
                return Ok(true);
            }
        }

        self.dispatch(AppEvent::Tick)
    }

    /// Hand one event to the app and execute the resulting actions.
    ///
    /// Returns `true` if should quit.
    fn dispatch(&mut self, mut event: AppEvent) -> Result<bool, D::Error> {
        self.watch_stream_end(&mut event);

        for action in self.app.handle(event) {
            match action {
                AppAction::Render => self.driver.render(self.app.phase(), self.app.session())?,
                AppAction::Quit => return Ok(true),
                AppAction::AcquireMedia { ticket } => self.acquire(ticket),
            }
        }
        Ok(false)
    }

    fn acquire(&mut self, ticket: AcquisitionTicket) {
        tracing::debug!(kind = %ticket.kind, seq = ticket.seq, "requesting media");
        let request = self.devices.request(ticket.kind);
        self.in_flight.push(
            async move {
                let result = request.await;
                Some(AppEvent::MediaAcquired { ticket, result })
            }
            .boxed(),
        );
    }

    /// Detach the ended signal of a freshly acquired stream and watch it.
    ///
    /// Streams released by the app resolve the signal as
    /// [`TrackEnd::Released`], which completes silently.
    fn watch_stream_end(&mut self, event: &mut AppEvent) {
        let AppEvent::MediaAcquired { result: Ok(stream), .. } = event else {
            return;
        };
        let Some(signal) = stream.take_ended_signal() else {
            return;
        };

        let stream_id = stream.id();
        self.in_flight.push(
            async move {
                match signal.await {
                    TrackEnd::External => Some(AppEvent::StreamEnded { stream_id }),
                    TrackEnd::Released => None,
                }
            }
            .boxed(),
        );
    }

    fn shutdown(&mut self) {
        self.app.shutdown();
        let dropped = self.in_flight.len();
        self.in_flight.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped in-flight work on shutdown");
        }
        self.driver.stop();
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App<E> {
        &self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
