//! Console command parsing.
//!
//! One command per line, whitespace separated. Free text (chat content,
//! names) takes the rest of the line.

use huddle_core::session::ParticipantId;
use thiserror::Error;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Toggle the microphone.
    Mute,
    /// Toggle the camera.
    Video,
    /// Toggle screen sharing.
    Share,
    /// Simulate the platform's "stop sharing" button.
    ShareEnded,
    /// Toggle the chat panel.
    Chat,
    /// Open the chat panel.
    Open,
    /// Close the chat panel.
    Close,
    /// Send a chat message as the local participant.
    Say(String),
    /// Receive a chat message from a remote participant.
    Recv {
        /// Sender id.
        sender: ParticipantId,
        /// Message text.
        content: String,
    },
    /// Pointer movement.
    Move,
    /// Click.
    Click,
    /// Two-finger pinch from one distance to another. The fingers stay down
    /// until [`Command::Release`].
    Pinch {
        /// Initial finger distance.
        from: f64,
        /// Current finger distance.
        to: f64,
    },
    /// Lift both fingers.
    Release,
    /// Resize the viewport.
    Resize {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A participant joins.
    Join {
        /// New participant id.
        id: ParticipantId,
        /// Display name.
        name: String,
    },
    /// A participant leaves.
    Leave(ParticipantId),
    /// Dismiss the current notice.
    Dismiss,
    /// End the call.
    End,
    /// Return to the meeting.
    Rejoin,
    /// Exit.
    Quit,
}

/// Errors from [`Command::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// Unrecognised command word.
    #[error("unknown command `{0}`")]
    Unknown(String),

    /// A required argument is missing.
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// An argument is not a valid number.
    #[error("`{command}`: invalid number `{value}`")]
    InvalidNumber {
        /// Command word.
        command: &'static str,
        /// The offending text.
        value: String,
    },
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word {
            "" => return Err(CommandError::Empty),
            "mute" => Self::Mute,
            "video" => Self::Video,
            "share" => Self::Share,
            "share-ended" => Self::ShareEnded,
            "chat" => Self::Chat,
            "open" => Self::Open,
            "close" => Self::Close,
            "say" => Self::Say(rest.to_owned()),
            "recv" => {
                let (sender, content) = split_id("recv", rest, "a sender id")?;
                Self::Recv { sender, content: content.to_owned() }
            },
            "move" => Self::Move,
            "click" => Self::Click,
            "pinch" => {
                let mut args = rest.split_whitespace();
                let from = number("pinch", args.next(), "two distances")?;
                let to = number("pinch", args.next(), "two distances")?;
                Self::Pinch { from, to }
            },
            "release" => Self::Release,
            "resize" => {
                let mut args = rest.split_whitespace();
                let width = number("resize", args.next(), "width and height")?;
                let height = number("resize", args.next(), "width and height")?;
                Self::Resize { width, height }
            },
            "join" => {
                let (id, name) = split_id("join", rest, "an id and a name")?;
                if name.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "join",
                        argument: "an id and a name",
                    });
                }
                Self::Join { id, name: name.to_owned() }
            },
            "leave" => {
                let (id, _) = split_id("leave", rest, "a participant id")?;
                Self::Leave(id)
            },
            "dismiss" => Self::Dismiss,
            "end" => Self::End,
            "rejoin" => Self::Rejoin,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_owned())),
        };
        Ok(command)
    }
}

fn split_id<'a>(
    command: &'static str,
    rest: &'a str,
    argument: &'static str,
) -> Result<(ParticipantId, &'a str), CommandError> {
    let (id, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if id.is_empty() {
        return Err(CommandError::MissingArgument { command, argument });
    }
    Ok((ParticipantId::new(id), tail.trim()))
}

fn number<T: std::str::FromStr>(
    command: &'static str,
    value: Option<&str>,
    argument: &'static str,
) -> Result<T, CommandError> {
    let value = value.ok_or(CommandError::MissingArgument { command, argument })?;
    value.parse().map_err(|_| CommandError::InvalidNumber { command, value: value.to_owned() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse("mute"), Ok(Command::Mute));
        assert_eq!(Command::parse("  share-ended "), Ok(Command::ShareEnded));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn say_keeps_the_rest_of_the_line() {
        assert_eq!(Command::parse("say hello  there"), Ok(Command::Say("hello  there".into())));
        assert_eq!(Command::parse("say"), Ok(Command::Say(String::new())));
    }

    #[test]
    fn recv_splits_sender_and_content() {
        assert_eq!(
            Command::parse("recv 3 good morning"),
            Ok(Command::Recv { sender: "3".into(), content: "good morning".into() })
        );
    }

    #[test]
    fn pinch_needs_two_numbers() {
        assert_eq!(Command::parse("pinch 100 150"), Ok(Command::Pinch { from: 100.0, to: 150.0 }));
        assert!(matches!(
            Command::parse("pinch 100"),
            Err(CommandError::MissingArgument { command: "pinch", .. })
        ));
        assert!(matches!(
            Command::parse("pinch wide 2"),
            Err(CommandError::InvalidNumber { command: "pinch", .. })
        ));
    }

    #[test]
    fn resize_parses_dimensions() {
        assert_eq!(
            Command::parse("resize 390 844"),
            Ok(Command::Resize { width: 390, height: 844 })
        );
        assert!(Command::parse("resize -1 2").is_err());
    }

    #[test]
    fn join_needs_id_and_name() {
        assert_eq!(
            Command::parse("join 13 Ada Lovelace"),
            Ok(Command::Join { id: "13".into(), name: "Ada Lovelace".into() })
        );
        assert!(Command::parse("join 13").is_err());
        assert!(Command::parse("leave").is_err());
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!(Command::parse(""), Err(CommandError::Empty));
        assert_eq!(Command::parse("dance"), Err(CommandError::Unknown("dance".into())));
    }
}
