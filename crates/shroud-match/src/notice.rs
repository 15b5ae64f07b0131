//! Player-facing notifications.
//!
//! The core never renders anything. It hands the host a [`Notice`] and the
//! host turns it into a title, action-bar line, or chat message, using
//! [`Notice::channel`] and the `Display` text as a default.

use std::fmt;

use shroud_model::PlayerId;

use crate::{Role, StallReason};

/// Where a notice is meant to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Large centred text.
    Title,
    /// The line above the hotbar.
    ActionBar,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    JoinedLobby { lobby: String, occupants: usize, capacity: usize },
    LeftLobby { lobby: String },
    /// Someone else joined or left the recipient's lobby.
    OccupancyChanged { player: PlayerId, joined: bool, occupants: usize, capacity: usize },
    CountdownStarted { secs: u64 },
    /// A player joined too recently; the start is pushed back.
    CountdownDeferred { secs: u64 },
    VoteOpened { candidates: Vec<String>, secs: u64 },
    VoteCast { arena: String },
    ArenaChosen { arena: String },
    MatchStarted { role: Role },
    TimeRemaining { secs: u64 },
    MatchEnded,
    MatchAborted { reason: StallReason },
}

impl Notice {
    pub fn channel(&self) -> Channel {
        match self {
            Self::MatchStarted { .. } | Self::MatchEnded => Channel::Title,
            Self::CountdownStarted { .. }
            | Self::CountdownDeferred { .. }
            | Self::VoteOpened { .. }
            | Self::TimeRemaining { .. } => Channel::ActionBar,
            Self::JoinedLobby { .. }
            | Self::LeftLobby { .. }
            | Self::OccupancyChanged { .. }
            | Self::VoteCast { .. }
            | Self::ArenaChosen { .. }
            | Self::MatchAborted { .. } => Channel::Chat,
        }
    }

    /// Whether the host should draw attention to it (e.g. red text).
    pub fn is_urgent(&self) -> bool {
        match self {
            Self::TimeRemaining { secs } => *secs <= 10,
            Self::MatchAborted { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinedLobby { lobby, occupants, capacity } => {
                write!(f, "You joined lobby {lobby} ({occupants}/{capacity})")
            }
            Self::LeftLobby { lobby } => write!(f, "You left lobby {lobby}"),
            Self::OccupancyChanged { player, joined: true, occupants, capacity } => {
                write!(f, "{player} joined ({occupants}/{capacity})")
            }
            Self::OccupancyChanged { player, joined: false, occupants, capacity } => {
                write!(f, "{player} left ({occupants}/{capacity})")
            }
            Self::CountdownStarted { secs } => write!(f, "Match starts in {secs}s"),
            Self::CountdownDeferred { secs } => {
                write!(f, "Waiting {secs}s for new players to get ready")
            }
            Self::VoteOpened { candidates, secs } => write!(
                f,
                "Vote for an arena! You have {secs} seconds: {}",
                candidates.join(", ")
            ),
            Self::VoteCast { arena } => write!(f, "You voted for {arena}"),
            Self::ArenaChosen { arena } => write!(f, "Arena selected: {arena}"),
            Self::MatchStarted { role } => write!(f, "Match Started! You are the {role}"),
            Self::TimeRemaining { secs } => write!(f, "{secs}s remaining"),
            Self::MatchEnded => f.write_str("Round Over!"),
            Self::MatchAborted { reason } => write!(f, "Match could not start: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels() {
        assert_eq!(Notice::MatchEnded.channel(), Channel::Title);
        assert_eq!(Notice::TimeRemaining { secs: 30 }.channel(), Channel::ActionBar);
        assert_eq!(
            Notice::ArenaChosen { arena: "A1".into() }.channel(),
            Channel::Chat
        );
    }

    #[test]
    fn test_urgency() {
        assert!(!Notice::TimeRemaining { secs: 30 }.is_urgent());
        assert!(Notice::TimeRemaining { secs: 10 }.is_urgent());
    }

    #[test]
    fn test_display() {
        let n = Notice::MatchStarted { role: Role::Shrouded };
        assert_eq!(n.to_string(), "Match Started! You are the Shrouded");
        let n = Notice::VoteOpened {
            candidates: vec!["A1".into(), "A2".into()],
            secs: 15,
        };
        assert_eq!(n.to_string(), "Vote for an arena! You have 15 seconds: A1, A2");
    }
}
