//! Property-based tests for App state machine.
//!
//! Tests verify that invariants hold under arbitrary event sequences,
//! including media results, roster churn and call teardown. The standard
//! registry checks media flags and stream bindings against the device
//! ledger in both directions.

use std::time::Duration;

use futures::FutureExt;
use huddle_app::{App, AppAction, AppEvent, Interaction};
use huddle_core::{
    SessionConfig,
    gesture::{TouchPhase, TouchPoint},
    media::{MediaDevices, MediaKind},
    session::ParticipantId,
};
use huddle_harness::{
    InvariantRegistry, SessionSnapshot, SimAudioMeter, SimEnv, SimMediaDevices, TrackLedger,
};
use proptest::prelude::*;

/// One step of simulated user, participant or device activity.
#[derive(Debug, Clone)]
enum Op {
    Wait(u16),
    Pointer,
    Pinch { from: f64, to: f64 },
    Release,
    Mute,
    Video,
    Share,
    ShareEnded,
    DenyNext(MediaKind),
    Chat,
    Say(String),
    Recv { sender: u8, content: String },
    Join(u8),
    Leave(u8),
    Speak { id: u8, peak: u8 },
    End,
    Rejoin,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u16..1000).prop_map(Op::Wait),
        1 => Just(Op::Pointer),
        2 => (10.0f64..300.0, 0.0f64..600.0).prop_map(|(from, to)| Op::Pinch { from, to }),
        1 => Just(Op::Release),
        1 => Just(Op::Mute),
        2 => Just(Op::Video),
        2 => Just(Op::Share),
        1 => Just(Op::ShareEnded),
        1 => prop_oneof![Just(MediaKind::Camera), Just(MediaKind::Screen)].prop_map(Op::DenyNext),
        1 => Just(Op::Chat),
        2 => "[a-z ]{0,8}".prop_map(Op::Say),
        2 => (1u8..16, "[a-z ]{0,8}").prop_map(|(sender, content)| Op::Recv { sender, content }),
        1 => (10u8..16).prop_map(Op::Join),
        1 => (1u8..16).prop_map(Op::Leave),
        3 => (2u8..16, any::<u8>()).prop_map(|(id, peak)| Op::Speak { id, peak }),
        1 => Just(Op::End),
        1 => Just(Op::Rejoin),
    ]
}

struct Sim {
    app: App<SimEnv>,
    env: SimEnv,
    meter: SimAudioMeter,
    devices: SimMediaDevices,
    ledger: std::sync::Arc<TrackLedger>,
}

impl Sim {
    fn new() -> Self {
        let env = SimEnv::new();
        let meter = SimAudioMeter::new();
        let devices = SimMediaDevices::new();
        let ledger = devices.ledger();
        let app = App::new(env.clone(), SessionConfig::default(), Box::new(meter.clone()), true);
        Self { app, env, meter, devices, ledger }
    }

    fn handle(&mut self, event: AppEvent) {
        let actions = self.app.handle(event);
        for action in actions {
            if let AppAction::AcquireMedia { ticket } = action
                && let Some(result) = self.devices.request(ticket.kind).now_or_never()
            {
                self.app.handle(AppEvent::MediaAcquired { ticket, result });
            }
        }
    }

    fn apply(&mut self, op: Op) {
        let pair = |d: f64| vec![TouchPoint::new(0.0, 0.0), TouchPoint::new(d, 0.0)];
        match op {
            Op::Wait(ms) => {
                self.env.advance(Duration::from_millis(u64::from(ms)));
                self.handle(AppEvent::Tick);
            },
            Op::Pointer => self.handle(AppEvent::Pointer(Interaction::Click)),
            Op::Pinch { from, to } => {
                self.handle(AppEvent::Touch { phase: TouchPhase::Start, touches: pair(from) });
                self.handle(AppEvent::Touch { phase: TouchPhase::Move, touches: pair(to) });
            },
            Op::Release => self.handle(AppEvent::Touch { phase: TouchPhase::End, touches: vec![] }),
            Op::Mute => self.handle(AppEvent::ToggleMute),
            Op::Video => self.handle(AppEvent::ToggleVideo),
            Op::Share => self.handle(AppEvent::ToggleScreenShare),
            Op::ShareEnded => {
                if let Some(stream_id) = self.app.media().live_stream(MediaKind::Screen) {
                    self.devices.end_screen_share();
                    self.handle(AppEvent::StreamEnded { stream_id });
                }
            },
            Op::DenyNext(kind) => self.devices.deny_next(kind),
            Op::Chat => self.handle(AppEvent::ToggleChat),
            Op::Say(content) => self.handle(AppEvent::ChatSubmit { content }),
            Op::Recv { sender, content } => {
                let sender = ParticipantId::new(sender.to_string());
                self.handle(AppEvent::MessageReceived { sender, content });
            },
            Op::Join(id) => self.handle(AppEvent::ParticipantJoined {
                id: ParticipantId::new(id.to_string()),
                name: format!("Guest {id}"),
            }),
            Op::Leave(id) => {
                self.handle(AppEvent::ParticipantLeft { id: ParticipantId::new(id.to_string()) });
            },
            Op::Speak { id, peak } => self.meter.queue(ParticipantId::new(id.to_string()), &[peak]),
            Op::End => self.handle(AppEvent::EndCall),
            Op::Rejoin => self.handle(AppEvent::Rejoin),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self.app.session()).with_ledger(&self.ledger)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_app_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut sim = Sim::new();
        let invariants = InvariantRegistry::standard();

        for op in ops {
            let label = format!("{op:?}");
            sim.apply(op);
            let checked = invariants.check_all(&sim.snapshot());
            prop_assert!(checked.is_ok(), "after {}: {:?}", label, checked);
        }
    }

    #[test]
    fn prop_quit_leaves_nothing_running(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut sim = Sim::new();
        for op in ops {
            sim.apply(op);
        }

        sim.handle(AppEvent::Quit);

        prop_assert_eq!(sim.ledger.total_running(), 0);
        prop_assert_eq!(sim.meter.open_sources(), 0);
        prop_assert_eq!(sim.app.next_deadline(), None);

        let local = sim.app.session().local_participant();
        prop_assert!(local.is_some_and(|p| !p.is_video_on && !p.is_screen_share_on));
        prop_assert!(local.is_some_and(|p| p.camera_stream.is_none() && p.screen_stream.is_none()));
        let checked = InvariantRegistry::standard().check_all(&sim.snapshot());
        prop_assert!(checked.is_ok(), "after quit: {:?}", checked);
    }

    #[test]
    fn prop_pipelines_track_roster(joins in prop::collection::vec(13u8..40, 0..6)) {
        let mut sim = Sim::new();

        for id in joins {
            sim.apply(Op::Join(id));
            let remote = sim.app.session().participants().len() - 1;
            prop_assert_eq!(sim.app.speaker_pipelines(), remote);
            prop_assert_eq!(sim.meter.open_sources(), remote);
        }
    }
}
