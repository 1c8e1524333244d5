//! Deck generation and the randomness behind it.
//!
//! Every random decision the engine makes goes through a [`Dealer`], so
//! tests can swap in a scripted one and get reproducible games.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rankwar_protocol::{Card, DECK_SIZE};

use crate::GameConfig;

/// Smallest and largest offset added to the base count of each deck.
pub const DECK_VARIATION: std::ops::RangeInclusive<i64> = -3..=7;

/// Source of every random choice in a game.
pub trait Dealer: Send + 'static {
    /// A fresh player deck for a game started with `base` cards.
    fn deal(&mut self, base: u32) -> Vec<Card>;

    /// Shuffles `cards` in place.
    fn shuffle(&mut self, cards: &mut [Card]);

    /// A uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// A [`Dealer`] backed by a [`rand`] generator.
#[derive(Debug, Clone)]
pub struct RandomDealer<R = StdRng> {
    rng: R,
}

impl RandomDealer<StdRng> {
    /// Seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic, for simulations and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDealer<StdRng> {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl<R: Rng + Send + 'static> Dealer for RandomDealer<R> {
    fn deal(&mut self, base: u32) -> Vec<Card> {
        generate_deck(&mut self.rng, base)
    }

    fn shuffle(&mut self, cards: &mut [Card]) {
        cards.shuffle(&mut self.rng);
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len.max(1))
    }
}

/// Builds one player deck: `max(1, base + v)` cards with `v` drawn from
/// [`DECK_VARIATION`], each card uniform over all 52 values.
///
/// Decks are drawn with replacement, so duplicates are expected.
pub fn generate_deck<R: Rng>(rng: &mut R, base: u32) -> Vec<Card> {
    let variation = rng.random_range(DECK_VARIATION);
    let len = (i64::from(base) + variation).max(1) as usize;
    (0..len)
        .map(|_| Card::wrapping(rng.random_range(0..DECK_SIZE)))
        .collect()
}

/// Resolves the base deck size for a new game.
///
/// `None`, zero, and negative requests fall back to the configured default;
/// anything above the configured maximum is clamped.
pub fn base_count(requested: Option<i64>, config: &GameConfig) -> u32 {
    match requested {
        Some(n) if n > i64::from(config.max_base_count) => {
            tracing::warn!(
                requested = n,
                max = config.max_base_count,
                "card multiplier above maximum, clamping"
            );
            config.max_base_count
        }
        Some(n) if n > 0 => n as u32,
        _ => config.default_base_count,
    }
}
