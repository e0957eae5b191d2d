//! Line-command console driver.
//!
//! Reads one [`Command`] per stdin line and reports every render as a
//! structured log line. Stdin is read on a dedicated thread so the runtime
//! keeps ticking while the user types, and a blocked read never holds up
//! shutdown.

use std::{
    collections::VecDeque,
    io::{self, BufRead},
    time::Duration,
};

use huddle_app::{AppEvent, CallPhase, Driver, Interaction};
use huddle_core::{
    gesture::{TouchPhase, TouchPoint},
    session::{MessageId, SessionStore},
};
use tokio::sync::mpsc;

use crate::{Command, MockMediaDevices, RuntimeError};

/// Upper bound on how long to wait for input, so finished acquisitions and
/// ended shares are picked up without a keypress.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Console driver: stdin commands in, log lines out.
pub struct ConsoleDriver {
    lines: mpsc::Receiver<io::Result<String>>,
    queued: VecDeque<AppEvent>,
    devices: MockMediaDevices,
    last_phase: Option<CallPhase>,
    logged_through: MessageId,
}

impl ConsoleDriver {
    /// Start reading commands from stdin.
    ///
    /// `devices` is used for platform-side actions such as ending a share.
    pub fn spawn(devices: MockMediaDevices) -> Self {
        let (tx, rx) = mpsc::channel(32);
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        });
        Self::from_receiver(rx, devices)
    }

    /// Driver fed from an existing line channel.
    pub fn from_receiver(lines: mpsc::Receiver<io::Result<String>>, devices: MockMediaDevices) -> Self {
        Self {
            lines,
            queued: VecDeque::new(),
            devices,
            last_phase: None,
            logged_through: 0,
        }
    }

    fn translate(&mut self, line: &str) -> Option<AppEvent> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(crate::CommandError::Empty) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring command");
                return None;
            },
        };

        let event = match command {
            Command::Mute => AppEvent::ToggleMute,
            Command::Video => AppEvent::ToggleVideo,
            Command::Share => AppEvent::ToggleScreenShare,
            Command::ShareEnded => {
                if !self.devices.end_screen_share() {
                    tracing::warn!("nothing is being shared");
                }
                return None;
            },
            Command::Chat => AppEvent::ToggleChat,
            Command::Open => AppEvent::SetChatOpen(true),
            Command::Close => AppEvent::SetChatOpen(false),
            Command::Say(content) => AppEvent::ChatSubmit { content },
            Command::Recv { sender, content } => AppEvent::MessageReceived { sender, content },
            Command::Move => AppEvent::Pointer(Interaction::PointerMove),
            Command::Click => AppEvent::Pointer(Interaction::Click),
            Command::Pinch { from, to } => {
                self.queued.push_back(AppEvent::Touch { phase: TouchPhase::Move, touches: fingers(to) });
                AppEvent::Touch { phase: TouchPhase::Start, touches: fingers(from) }
            },
            Command::Release => AppEvent::Touch { phase: TouchPhase::End, touches: Vec::new() },
            Command::Resize { width, height } => AppEvent::Resize { width, height },
            Command::Join { id, name } => AppEvent::ParticipantJoined { id, name },
            Command::Leave(id) => AppEvent::ParticipantLeft { id },
            Command::Dismiss => AppEvent::DismissNotice,
            Command::End => AppEvent::EndCall,
            Command::Rejoin => AppEvent::Rejoin,
            Command::Quit => AppEvent::Quit,
        };
        Some(event)
    }

    fn log_new_messages(&mut self, phase: CallPhase, session: &SessionStore) {
        if self.last_phase == Some(CallPhase::Ended) && phase == CallPhase::InCall {
            self.logged_through = 0;
        }
        self.last_phase = Some(phase);

        for message in session.messages().iter().filter(|m| m.id > self.logged_through) {
            tracing::info!(
                id = message.id,
                time = %message.time.format("%H:%M"),
                from = %message.sender_name,
                "chat: {}",
                message.content
            );
        }
        if let Some(last) = session.messages().last() {
            self.logged_through = last.id;
        }
    }
}

/// Two fingers on a horizontal line, `distance` apart.
fn fingers(distance: f64) -> Vec<TouchPoint> {
    vec![TouchPoint::new(0.0, 0.0), TouchPoint::new(distance, 0.0)]
}

impl Driver for ConsoleDriver {
    type Error = RuntimeError;

    async fn poll_event(&mut self, wait: Option<Duration>) -> Result<Option<AppEvent>, Self::Error> {
        if let Some(event) = self.queued.pop_front() {
            return Ok(Some(event));
        }

        let timeout = wait.map_or(POLL_INTERVAL, |wait| wait.min(POLL_INTERVAL));

        tokio::select! {
            biased;

            line = self.lines.recv() => match line {
                Some(Ok(line)) => Ok(self.translate(&line)),
                Some(Err(e)) => Err(RuntimeError::Io(e)),
                None => Ok(Some(AppEvent::Quit)),
            },

            () = tokio::time::sleep(timeout) => Ok(None),
        }
    }

    fn render(&mut self, phase: CallPhase, session: &SessionStore) -> Result<(), Self::Error> {
        if phase == CallPhase::Ended {
            tracing::info!("call ended; type `rejoin` to return or `quit` to exit");
            self.last_phase = Some(phase);
            return Ok(());
        }

        self.log_new_messages(phase, session);

        let local = session.local_participant();
        tracing::info!(
            participants = session.participants().len(),
            active = session.active_speaker().map_or("-", |p| p.name.as_str()),
            pinned = session.pinned().map_or("-", |id| id.as_str()),
            zoom = session.zoom_scale(),
            orientation = ?session.orientation(),
            chat_open = session.is_chat_open(),
            unread = session.unread_count(),
            controls = session.controls_visible(),
            muted = local.is_some_and(|p| p.is_muted),
            video = local.is_some_and(|p| p.is_video_on),
            sharing = local.is_some_and(|p| p.is_screen_share_on),
            "render"
        );

        if let Some(notice) = session.notice() {
            tracing::warn!("{}", notice.message);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.lines.close();
        tracing::debug!("console driver stopped");
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn driver() -> (mpsc::Sender<io::Result<String>>, ConsoleDriver) {
        let (tx, rx) = mpsc::channel(8);
        (tx, ConsoleDriver::from_receiver(rx, MockMediaDevices::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn lines_become_events() {
        let (tx, mut driver) = driver();
        tx.send(Ok("mute".into())).await.unwrap();
        tx.send(Ok("say hi all".into())).await.unwrap();

        let first = driver.poll_event(None).await.unwrap();
        let second = driver.poll_event(None).await.unwrap();

        assert!(matches!(first, Some(AppEvent::ToggleMute)));
        assert!(matches!(second, Some(AppEvent::ChatSubmit { content }) if content == "hi all"));
    }

    #[tokio::test]
    async fn pinch_is_a_start_then_a_move() {
        let (tx, mut driver) = driver();
        tx.send(Ok("pinch 100 150".into())).await.unwrap();

        let start = driver.poll_event(None).await.unwrap();
        let moved = driver.poll_event(None).await.unwrap();

        assert!(matches!(start, Some(AppEvent::Touch { phase: TouchPhase::Start, .. })));
        let Some(AppEvent::Touch { phase: TouchPhase::Move, touches }) = moved else {
            panic!("expected touch move, got {moved:?}");
        };
        assert!((touches[0].distance(&touches[1]) - 150.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_command_is_skipped() {
        let (tx, mut driver) = driver();
        tx.send(Ok("dance".into())).await.unwrap();

        assert!(matches!(driver.poll_event(None).await, Ok(None)));
    }

    #[tokio::test]
    async fn closed_input_quits() {
        let (tx, mut driver) = driver();
        drop(tx);

        assert!(matches!(driver.poll_event(None).await, Ok(Some(AppEvent::Quit))));
    }

    #[tokio::test]
    async fn read_error_is_returned() {
        let (tx, mut driver) = driver();
        tx.send(Err(io::Error::other("stdin gone"))).await.unwrap();

        assert!(matches!(driver.poll_event(None).await, Err(RuntimeError::Io(_))));
    }

    #[tokio::test]
    async fn no_input_times_out() {
        let (_tx, mut driver) = driver();

        let event = driver.poll_event(Some(Duration::from_millis(5))).await;

        assert!(matches!(event, Ok(None)));
    }

    #[tokio::test]
    async fn share_ended_without_share_yields_nothing() {
        let (tx, mut driver) = driver();
        tx.send(Ok("share-ended".into())).await.unwrap();

        assert!(matches!(driver.poll_event(None).await, Ok(None)));
    }

    #[test]
    fn render_logs_only_new_messages() {
        let (_tx, mut driver) = driver();
        let session = SessionStore::with_mock_session(DateTime::UNIX_EPOCH);

        driver.render(CallPhase::InCall, &session).unwrap();
        assert_eq!(driver.logged_through, 3);

        driver.render(CallPhase::Ended, &session).unwrap();
        let fresh = SessionStore::with_mock_session(DateTime::UNIX_EPOCH);
        driver.render(CallPhase::InCall, &fresh).unwrap();
        assert_eq!(driver.logged_through, 3);
    }
}
