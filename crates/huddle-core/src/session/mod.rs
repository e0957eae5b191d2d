//! Session state store and the data it owns.
//!
//! The [`SessionStore`] is the only mutable shared state in a session. Every
//! other component mutates it through its named operations and the renderer
//! reads it as a snapshot.

mod message;
mod participant;
mod seed;
mod store;

pub use message::{Message, MessageId};
pub use participant::{LOCAL_PARTICIPANT_ID, Orientation, Participant, ParticipantId};
pub use seed::{mock_roster, seed_messages};
pub use store::{MAX_ZOOM, MIN_ZOOM, Notice, SessionStore};
