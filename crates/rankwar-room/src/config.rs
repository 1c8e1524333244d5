//! Game tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and deck settings shared by every room on a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// How long the turn holder has before their turn is skipped.
    pub turn_timeout: Duration,

    /// Pause between plays while autoplay drives a room.
    pub autoplay_delay: Duration,

    /// Pause before an autoplay-triggered tie-breaker is resolved, so
    /// clients can show the tie-breaker stage first.
    pub tie_breaker_delay: Duration,

    /// Base deck size when `start_game` asks for none, zero, a negative
    /// count, or something that is not a number.
    pub default_base_count: u32,

    /// Largest base deck size a client may ask for.
    pub max_base_count: u32,

    /// Diagnostics are on: clients are told so in `config`, and the room
    /// owner may engage autoplay.
    pub diagnostics: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(30),
            autoplay_delay: Duration::from_millis(600),
            tie_breaker_delay: Duration::from_millis(500),
            default_base_count: 20,
            max_base_count: 500,
            diagnostics: false,
        }
    }
}

impl GameConfig {
    /// Shortest turn timeout accepted by [`validated`](Self::validated).
    pub const MIN_TURN_TIMEOUT: Duration = Duration::from_secs(1);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// - `turn_timeout` is raised to [`Self::MIN_TURN_TIMEOUT`].
    /// - `max_base_count` is at least 1.
    /// - `default_base_count` lies in `1..=max_base_count`.
    pub fn validated(mut self) -> Self {
        if self.turn_timeout < Self::MIN_TURN_TIMEOUT {
            tracing::warn!(
                turn_timeout_ms = self.turn_timeout.as_millis() as u64,
                "turn_timeout below minimum, clamping"
            );
            self.turn_timeout = Self::MIN_TURN_TIMEOUT;
        }
        if self.max_base_count == 0 {
            tracing::warn!("max_base_count is 0, clamping to 1");
            self.max_base_count = 1;
        }
        let clamped = self.default_base_count.clamp(1, self.max_base_count);
        if clamped != self.default_base_count {
            tracing::warn!(
                default_base_count = self.default_base_count,
                max = self.max_base_count,
                "default_base_count out of range, clamping"
            );
            self.default_base_count = clamped;
        }
        self
    }
}
