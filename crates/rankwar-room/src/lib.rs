//! Rooms and the rankwar game engine.
//!
//! # Key types
//!
//! - [`GameEngine`]: applies client events and timer firings to rooms
//! - [`RoomRegistry`]: name-keyed table of live rooms
//! - [`Room`] / [`Player`]: seats, decks, the center pile, the turn
//! - [`Dealer`]: every random decision, swappable for tests
//! - [`GameConfig`]: timeouts and deck sizes
//!
//! The engine does no I/O. It queues [`Delivery`] values for the caller to
//! send and keeps one deadline per room, which the caller awaits through
//! [`GameEngine::next_due`].

mod config;
pub mod deck;
mod engine;
mod error;
mod registry;
mod room;

pub use config::GameConfig;
pub use deck::{Dealer, RandomDealer};
pub use engine::{Delivery, GameEngine, RoomTask};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Departure, Play, Player, Room};
pub use rankwar_timer::Due;
