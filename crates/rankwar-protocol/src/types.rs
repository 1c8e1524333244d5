//! Event types for rankwar's wire format.
//!
//! Both directions use adjacently tagged JSON:
//!
//! ```text
//! { "event": "join_room", "data": { "roomName": "A", "playerName": "ann" } }
//! { "event": "your_top_card", "data": 17 }
//! { "event": "turn_timeout" }
//! ```
//!
//! Payload field names are camelCase, matching what browser clients send.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Card, ProtocolError};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies a connected player. Lives exactly as long as the connection
/// it was assigned to; a reconnecting client gets a new one.
///
/// Serialized as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The stage a room's game is in.
///
/// ```text
/// Waiting → Playing ⇄ TieBreaker → Finished
/// ```
///
/// `TieBreaker` is transient: it is entered when a play eliminates a
/// player and leaves exactly one opponent holding cards, and is left as
/// soon as the tie is resolved.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Waiting,
    Playing,
    TieBreaker,
    Finished,
}

impl Stage {
    /// `true` while a game is running (turns or a tie-breaker in progress).
    pub fn in_game(self) -> bool {
        matches!(self, Self::Playing | Self::TieBreaker)
    }

    /// Returns `true` if moving from `self` to `target` is a legal step.
    ///
    /// A sudden-death tie-breaker passes through `TieBreaker` on its way to
    /// `Finished`, and an ordinary one may drop back to `Playing`.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing)
                | (Self::Playing, Self::TieBreaker)
                | (Self::Playing, Self::Finished)
                | (Self::TieBreaker, Self::Playing)
                | (Self::TieBreaker, Self::Finished)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::TieBreaker => "tie_breaker",
            Self::Finished => "finished",
        })
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Payload for `create_room` and `join_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntry {
    pub room_name: String,
    pub player_name: String,
}

/// Payload for events that only name a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub room_name: String,
}

/// The base deck size requested with `start_game`.
///
/// Browser clients send the raw value of a number input, which may arrive
/// as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardMultiplier {
    Number(f64),
    Text(String),
}

impl CardMultiplier {
    /// The requested count, truncated toward zero. `None` when the value
    /// is not a finite number or is zero, which callers treat as "use the
    /// default".
    pub fn count(&self) -> Option<i64> {
        let raw = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        if !raw.is_finite() {
            return None;
        }
        let count = raw.trunc() as i64;
        (count != 0).then_some(count)
    }
}

/// Payload for `start_game`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGame {
    pub room_name: String,
    #[serde(default)]
    pub card_multiplier: Option<CardMultiplier>,
}

/// Payload for `send_emoji`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiRequest {
    pub room_name: String,
    pub emoji: String,
    pub player_name: String,
}

/// Every intent a client can send. Anything else fails to decode and is
/// dropped by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom(RoomEntry),
    JoinRoom(RoomEntry),
    StartGame(StartGame),
    PlayCard(RoomRef),
    DebugAutoplay(RoomRef),
    ForceTiebreaker(RoomRef),
    SendEmoji(EmojiRequest),
    LeaveRoom(RoomRef),
}

impl ClientEvent {
    /// The room this event targets.
    pub fn room_name(&self) -> &str {
        match self {
            Self::CreateRoom(e) | Self::JoinRoom(e) => &e.room_name,
            Self::StartGame(e) => &e.room_name,
            Self::SendEmoji(e) => &e.room_name,
            Self::PlayCard(r)
            | Self::DebugAutoplay(r)
            | Self::ForceTiebreaker(r)
            | Self::LeaveRoom(r) => &r.room_name,
        }
    }

    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => "create_room",
            Self::JoinRoom(_) => "join_room",
            Self::StartGame(_) => "start_game",
            Self::PlayCard(_) => "play_card",
            Self::DebugAutoplay(_) => "debug_autoplay",
            Self::ForceTiebreaker(_) => "force_tiebreaker",
            Self::SendEmoji(_) => "send_emoji",
            Self::LeaveRoom(_) => "leave_room",
        }
    }

    /// Rejects events that decoded but name nothing usable.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidEvent`] when the room name, or the player
    /// name of a create/join, is blank.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.room_name().trim().is_empty() {
            return Err(ProtocolError::InvalidEvent(format!(
                "{}: roomName must not be blank",
                self.name()
            )));
        }
        if let Self::CreateRoom(e) | Self::JoinRoom(e) = self {
            if e.player_name.trim().is_empty() {
                return Err(ProtocolError::InvalidEvent(format!(
                    "{}: playerName must not be blank",
                    self.name()
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Feature flags sent once, right after a connection opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Diagnostics (autoplay button) are enabled on this server.
    pub dev: bool,
}

/// What everyone may know about a player: never the deck itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    /// Cards left in the player's deck.
    pub cards: usize,
}

/// Public view of a room, broadcast after every visible mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub name: String,
    pub owner_id: PlayerId,
    pub players: Vec<PublicPlayer>,
    pub turn_index: usize,
    /// Top of the center pile; `null` only when the pile is empty.
    pub center_top: Option<Card>,
    pub center_count: usize,
    pub stage: Stage,
    pub tie_breaker_card: Option<Card>,
}

/// The winner of a tie-breaker or of the whole game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub winner_id: PlayerId,
    pub winner_name: String,
}

/// A reaction relayed to everyone in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiRelay {
    pub emoji: String,
    pub player_name: String,
}

/// Every event the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once on connect.
    Config(ClientConfig),
    /// Broadcast to the whole room.
    RoomState(RoomSnapshot),
    /// Private: the recipient's own next card, or `null` when out of cards.
    YourTopCard(Option<Card>),
    /// Broadcast before any `game_over` that the tie-breaker causes, so
    /// clients can finish the tie-breaker animation first.
    TiebreakerResult(Winner),
    GameOver(Winner),
    /// Private: the recipient's turn was skipped.
    TurnTimeout,
    /// Private: the recipient's last request was refused.
    ErrorMsg(String),
    Emoji(EmojiRelay),
}
