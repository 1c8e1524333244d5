//! Wire protocol for rankwar.
//!
//! Clients and the server exchange discrete named events. Every frame is
//! a JSON object of the form `{ "event": "<name>", "data": <payload> }`:
//!
//! - [`ClientEvent`]: player intents (create/join a room, play a card, ...)
//! - [`ServerEvent`]: snapshots and notifications pushed by the server
//!
//! The crate also owns the [`Card`] identifier, the public [`Stage`] of a
//! room, and the [`Codec`] that turns events into bytes.

mod card;
mod codec;
mod error;
mod types;

pub use card::{Card, DECK_SIZE, RANK_COUNT};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    CardMultiplier, ClientConfig, ClientEvent, EmojiRelay, EmojiRequest,
    PlayerId, PublicPlayer, RoomEntry, RoomRef, RoomSnapshot, ServerEvent,
    Stage, StartGame, Winner,
};
