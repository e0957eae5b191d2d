//! Property-based tests for the session core.
//!
//! These tests verify invariants that must hold for all inputs: message id
//! monotonicity, the exclusive active speaker, the zoom clamp, the unread
//! arithmetic and pin cleanup when participants leave.

use chrono::{DateTime, TimeZone, Utc};
use huddle_core::{
    SessionError,
    gesture::{GestureInterpreter, TouchPhase, TouchPoint},
    session::{Participant, ParticipantId, SessionStore, mock_roster},
    speaker::{SpeakerConfig, SpeakerDetector},
};
use proptest::prelude::*;

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default()
}

fn small_roster() -> SessionStore {
    SessionStore::new([
        Participant::new("1", "You"),
        Participant::new("2", "John"),
        Participant::new("3", "Jane"),
        Participant::new("4", "Mike"),
    ])
}

/// Content that may or may not be blank.
fn content_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => "[a-z ]{1,12}",
        1 => "[ \t\n]{0,4}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: accepted ids are 1..=n in order, blanks never change the log
    #[test]
    fn prop_message_ids_count_accepted_sends(
        sends in prop::collection::vec((0usize..4, content_strategy()), 0..40)
    ) {
        let mut store = small_roster();
        let mut accepted = 0u64;

        for (sender, content) in sends {
            let sender = store.participants()[sender].id.clone();
            let before = store.messages().len();
            match store.append_message(&sender, content.clone(), epoch()) {
                Ok(id) => {
                    accepted += 1;
                    prop_assert_eq!(id, accepted);
                },
                Err(e) => {
                    prop_assert_eq!(e, SessionError::EmptyContent);
                    prop_assert!(content.trim().is_empty());
                    prop_assert_eq!(store.messages().len(), before);
                },
            }
        }

        for pair in store.messages().windows(2) {
            prop_assert!(pair[0].id < pair[1].id);
        }
    }

    /// Property: any sequence of samples leaves at most one active speaker
    #[test]
    fn prop_at_most_one_active_speaker(
        samples in prop::collection::vec((0usize..12, any::<u8>()), 0..100)
    ) {
        let mut store = SessionStore::new(mock_roster());
        let detector = SpeakerDetector::<std::time::Instant>::new(SpeakerConfig::default());
        let mut expected = store.active_speaker().map(|p| p.id.clone());

        for (index, peak) in samples {
            let id = store.participants()[index].id.clone();
            if detector.record_sample(&mut store, &id, peak) {
                expected = Some(id);
            }
            prop_assert!(store.participants().iter().filter(|p| p.is_active).count() <= 1);
        }

        prop_assert_eq!(store.active_speaker().map(|p| p.id.clone()), expected);
    }

    /// Property: a pinch from D to d publishes clamp(d / D, 1, 3)
    #[test]
    fn prop_pinch_zoom_is_clamped_ratio(initial in 10.0f64..500.0, current in 0.0f64..2000.0) {
        let mut store = small_roster();
        let mut gestures = GestureInterpreter::default();

        gestures.handle(TouchPhase::Start, &[TouchPoint::new(0.0, 0.0), TouchPoint::new(0.0, initial)], &mut store);
        gestures.handle(TouchPhase::Move, &[TouchPoint::new(0.0, 0.0), TouchPoint::new(0.0, current)], &mut store);

        let expected = (current / initial).clamp(1.0, 3.0);
        prop_assert!((store.zoom_scale() - expected).abs() < 1e-9);

        gestures.handle(TouchPhase::End, &[], &mut store);
        prop_assert!((store.zoom_scale() - 1.0).abs() < f64::EPSILON);
        prop_assert!(store.pinned().is_none());
    }

    /// Property: after mark_read, unread grows by one per remote message only
    #[test]
    fn prop_unread_tracks_remote_messages(senders in prop::collection::vec(0usize..4, 0..30)) {
        let mut store = small_roster();
        store.append_message(&ParticipantId::new("2"), "earlier", epoch())?;
        store.mark_read();
        prop_assert_eq!(store.unread_count(), 0);

        let mut remote = 0;
        for sender in senders {
            let sender = store.participants()[sender].id.clone();
            store.append_message(&sender, "hello", epoch())?;
            if !sender.is_local() {
                remote += 1;
            }
            prop_assert_eq!(store.unread_count(), remote);
        }
    }

    /// Property: whoever leaves, the pin never points outside the roster
    #[test]
    fn prop_leaving_never_strands_the_pin(
        pinned in 2usize..13,
        leavers in prop::collection::vec(1usize..13, 1..8),
    ) {
        let mut store = SessionStore::new(mock_roster());
        store.set_pinned(Some(ParticipantId::new(pinned.to_string())))?;

        for leaver in leavers {
            let id = ParticipantId::new(leaver.to_string());
            let _ = store.remove_participant(&id);
            if let Some(pin) = store.pinned() {
                prop_assert!(store.participant(pin).is_some());
            }
        }
        prop_assert!(store.participant(&ParticipantId::local()).is_some());
    }
}
