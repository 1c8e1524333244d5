//! Error types for the room layer.

use rankwar_protocol::{PlayerId, Stage};

/// Why a room operation was refused.
///
/// Refusals never change state. Only the [user-facing](Self::is_user_facing)
/// ones are reported back to the sender, using their `Display` text as the
/// `error_msg` payload; the rest usually come from a client acting on a
/// stale view and are only logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// `create_room` named a room that already exists.
    #[error("Room already exists")]
    RoomExists(String),

    /// `join_room` named a room that does not exist.
    #[error("Room not found")]
    RoomNotFound(String),

    /// `join_room` arrived after the game started.
    #[error("Game already started")]
    GameStarted(String),

    /// `join_room` used a display name already present in the room,
    /// ignoring case.
    #[error("Name already taken in this room. Please choose another name.")]
    NameTaken(String),

    /// Any other event named a room that does not exist.
    #[error("no room named {0:?}")]
    NoSuchRoom(String),

    /// The sender is already seated in the room.
    #[error("player {0} is already in the room")]
    AlreadyInRoom(PlayerId),

    /// The sender is not seated in the room.
    #[error("player {0} is not in the room")]
    NotInRoom(PlayerId),

    /// Owner-only action from someone else.
    #[error("player {0} does not own the room")]
    NotOwner(PlayerId),

    /// `play_card` from a player who does not hold the turn.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),

    /// `play_card` from a turn holder with an empty deck.
    #[error("player {0} has no cards left")]
    OutOfCards(PlayerId),

    /// The room is in the wrong stage for this action.
    #[error("room is {actual}, expected {expected}")]
    WrongStage { expected: Stage, actual: Stage },

    /// A sudden-death tie-breaker found no cards in anyone's hands.
    #[error("no cards left in play")]
    NoCardsInPlay,

    /// Autoplay was requested on a server without diagnostics.
    #[error("diagnostics are disabled")]
    DiagnosticsDisabled,
}

impl RoomError {
    /// `true` for refusals the sender is told about via `error_msg`.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::RoomExists(_)
                | Self::RoomNotFound(_)
                | Self::GameStarted(_)
                | Self::NameTaken(_)
        )
    }
}
