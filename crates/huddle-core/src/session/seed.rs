//! Fixed mock roster and chat history a session starts with.

use chrono::{DateTime, TimeDelta, Utc};

use super::{Participant, ParticipantId};

const ROSTER: [(&str, &str); 12] = [
    ("1", "You"),
    ("2", "John Doe"),
    ("3", "Jane Smith"),
    ("4", "Mike Johnson"),
    ("5", "Sarah Wilson"),
    ("6", "Alex Chen"),
    ("7", "Emma Rodriguez"),
    ("8", "David Kim"),
    ("9", "Angelina Jolie"),
    ("10", "Brad Pitt"),
    ("11", "Tom Hanks"),
    ("12", "Meryl Streep"),
];

/// The mock roster. John Doe starts out as the detected speaker.
pub fn mock_roster() -> Vec<Participant> {
    ROSTER
        .iter()
        .map(|&(id, name)| {
            let mut participant = Participant::new(id, name);
            participant.is_active = id == "2";
            participant
        })
        .collect()
}

/// Seed chat history as `(sender, content, time)`, oldest first.
pub fn seed_messages(now: DateTime<Utc>) -> Vec<(ParticipantId, String, DateTime<Utc>)> {
    let ago = |minutes: i64| now - TimeDelta::minutes(minutes);
    vec![
        (ParticipantId::new("2"), "Hey everyone, is the meeting starting soon?".to_owned(), ago(5)),
        (ParticipantId::new("3"), "Yes, I'm here and ready!".to_owned(), ago(2)),
        (ParticipantId::local(), "Great, let's begin the meeting.".to_owned(), now),
    ]
}
