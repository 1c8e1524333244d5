//! # rankwar
//!
//! Real-time multiplayer server for a rank-matching card game.
//!
//! Players create or join named rooms over a WebSocket, the owner deals
//! everyone a random deck, and players take turns dropping their front
//! card onto a shared pile. A card matching the rank of the previous top
//! captures the pile. Running out of cards against a single opponent
//! triggers a tie-breaker; the last player holding cards wins.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rankwar::prelude::*;
//!
//! # async fn start() -> Result<(), RankwarError> {
//! let server = RankwarServer::builder()
//!     .bind("127.0.0.1:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod actor;
mod config;
mod error;
mod handler;
mod server;

pub use actor::PlayerSender;
pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::RankwarError;
pub use server::{RankwarServer, RankwarServerBuilder};

/// Everything needed to run a server or speak its protocol.
pub mod prelude {
    pub use crate::{RankwarError, RankwarServer, RankwarServerBuilder, ServerConfig};
    pub use rankwar_protocol::{
        Card, ClientConfig, ClientEvent, Codec, JsonCodec, PlayerId, RoomSnapshot, ServerEvent, Stage, Winner,
    };
    pub use rankwar_room::{GameConfig, RoomError};
}
