//! The command channel into a running [`Shroud`](crate::Shroud).
//!
//! Host event listeners (a player clicking a marker sign, a `/vote`
//! command, a disconnect) usually run outside the task that owns the
//! match core. They talk to it through a [`ShroudHandle`]: each call sends
//! a command down an `mpsc` channel and waits for the reply on a
//! `oneshot`. The runtime loop applies commands one at a time between
//! ticks, so match operations never interleave.

use shroud_match::{MatchPhase, Role};
use shroud_model::{BlockPos, PlayerId};
use tokio::sync::{mpsc, oneshot};

use crate::ShroudError;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, ShroudError>>;

/// Commands sent to the runtime loop.
///
/// Every variant but `Shutdown` carries a reply channel.
pub(crate) enum Command {
    Join {
        player: PlayerId,
        lobby: String,
        reply: Reply<()>,
    },
    Leave {
        player: PlayerId,
        reply: Reply<()>,
    },
    UseMarker {
        player: PlayerId,
        pos: BlockPos,
        reply: Reply<Option<MarkerAction>>,
    },
    SetRole {
        player: PlayerId,
        role: Role,
        reply: Reply<()>,
    },
    Vote {
        player: PlayerId,
        arena: String,
        reply: Reply<()>,
    },
    ForceStart {
        lobby: String,
        reply: Reply<bool>,
    },
    Dismiss {
        lobby: String,
        reply: Reply<Vec<PlayerId>>,
    },
    PlayerConnected {
        player: PlayerId,
        reply: Reply<bool>,
    },
    PlayerDisconnected {
        player: PlayerId,
        reply: Reply<bool>,
    },
    Status {
        lobby: String,
        reply: Reply<LobbyStatus>,
    },
    Shutdown,
}

/// What clicking a marker block did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerAction {
    Joined(String),
    Left(String),
}

/// A point-in-time view of one lobby's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyStatus {
    pub lobby: String,
    pub phase: MatchPhase,
    pub occupants: Vec<PlayerId>,
    pub capacity: usize,
    /// The arena the running round is played in.
    pub arena: Option<String>,
    pub remaining_secs: u64,
}

/// The receiving end, consumed by [`Shroud::run`](crate::Shroud::run).
pub struct Commands {
    pub(crate) receiver: mpsc::Receiver<Command>,
}

impl Commands {
    pub(crate) async fn recv(&mut self) -> Option<Command> {
        self.receiver.recv().await
    }
}

/// Creates a bounded command channel. When it fills up, senders wait.
pub fn channel(size: usize) -> (ShroudHandle, Commands) {
    let (sender, receiver) = mpsc::channel(size.max(1));
    (ShroudHandle { sender }, Commands { receiver })
}

/// Cheap to clone; every host listener can hold one.
///
/// All methods fail with [`ShroudError::Unavailable`] once the runtime
/// has stopped.
#[derive(Clone)]
pub struct ShroudHandle {
    sender: mpsc::Sender<Command>,
}

impl ShroudHandle {
    pub async fn join(&self, player: PlayerId, lobby: &str) -> Result<(), ShroudError> {
        let lobby = lobby.to_owned();
        self.request(|reply| Command::Join {
            player,
            lobby,
            reply,
        })
        .await
    }

    pub async fn leave(&self, player: PlayerId) -> Result<(), ShroudError> {
        self.request(|reply| Command::Leave { player, reply }).await
    }

    /// Joins or leaves depending on which marker `pos` is. `None` if it
    /// isn't a marker at all.
    pub async fn use_marker(
        &self,
        player: PlayerId,
        pos: BlockPos,
    ) -> Result<Option<MarkerAction>, ShroudError> {
        self.request(|reply| Command::UseMarker { player, pos, reply })
            .await
    }

    pub async fn set_role(&self, player: PlayerId, role: Role) -> Result<(), ShroudError> {
        self.request(|reply| Command::SetRole {
            player,
            role,
            reply,
        })
        .await
    }

    pub async fn vote(&self, player: PlayerId, arena: &str) -> Result<(), ShroudError> {
        let arena = arena.to_owned();
        self.request(|reply| Command::Vote {
            player,
            arena,
            reply,
        })
        .await
    }

    pub async fn force_start(&self, lobby: &str) -> Result<bool, ShroudError> {
        let lobby = lobby.to_owned();
        self.request(|reply| Command::ForceStart { lobby, reply })
            .await
    }

    pub async fn dismiss(&self, lobby: &str) -> Result<Vec<PlayerId>, ShroudError> {
        let lobby = lobby.to_owned();
        self.request(|reply| Command::Dismiss { lobby, reply }).await
    }

    /// Restores a returning player's leftover snapshot, if any.
    pub async fn player_connected(&self, player: PlayerId) -> Result<bool, ShroudError> {
        self.request(|reply| Command::PlayerConnected { player, reply })
            .await
    }

    /// Takes a disconnecting player out of their lobby. Returns whether
    /// they were in one.
    pub async fn player_disconnected(&self, player: PlayerId) -> Result<bool, ShroudError> {
        self.request(|reply| Command::PlayerDisconnected { player, reply })
            .await
    }

    pub async fn status(&self, lobby: &str) -> Result<LobbyStatus, ShroudError> {
        let lobby = lobby.to_owned();
        self.request(|reply| Command::Status { lobby, reply }).await
    }

    /// Stops the runtime loop after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), ShroudError> {
        self.sender
            .send(Command::Shutdown)
            .await
            .map_err(|_| ShroudError::Unavailable)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ShroudError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| ShroudError::Unavailable)?;
        reply_rx.await.map_err(|_| ShroudError::Unavailable)?
    }
}
