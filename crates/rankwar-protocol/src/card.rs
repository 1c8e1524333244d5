//! Card identifiers.
//!
//! A card is an integer in `[0, 52)`. Suits are not modeled: two cards
//! capture each other when their ranks (`value % 13`) are equal, and a
//! tie-breaker looks for an exact identifier match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of distinct card identifiers.
pub const DECK_SIZE: u8 = 52;

/// Number of ranks. Rank 0 is the Ace.
pub const RANK_COUNT: u8 = 13;

/// A single card, serialized as its plain identifier (`37`, not `{"0":37}`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(transparent)]
pub struct Card(u8);

impl Card {
    /// Returns the card with the given identifier, or `None` when it lies
    /// outside `[0, 52)`.
    pub fn new(value: u8) -> Option<Self> {
        (value < DECK_SIZE).then_some(Self(value))
    }

    /// Maps any byte onto a card by reducing it modulo 52.
    pub fn wrapping(value: u8) -> Self {
        Self(value % DECK_SIZE)
    }

    /// The raw identifier.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Rank in `0..13`, where 0 is the Ace.
    pub fn rank(self) -> u8 {
        self.0 % RANK_COUNT
    }

    /// Face value with Ace high: Ace → 14, rank `r` → `r + 1`.
    pub fn face_value(self) -> u8 {
        match self.rank() {
            0 => 14,
            r => r + 1,
        }
    }

    /// `true` when both cards share a rank.
    pub fn same_rank(self, other: Card) -> bool {
        self.rank() == other.rank()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// Hand-written so an out-of-range identifier is rejected at the wire.
impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Card::new(value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "card {value} out of range 0..{DECK_SIZE}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(v: u8) -> Card {
        Card::new(v).unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Card::new(51).is_some());
        assert!(Card::new(52).is_none());
    }

    #[test]
    fn test_wrapping_reduces_modulo_deck_size() {
        assert_eq!(Card::wrapping(51), card(51));
        assert_eq!(Card::wrapping(52), card(0));
        assert_eq!(Card::wrapping(255), card(255 % 52));
    }

    #[test]
    fn test_rank_is_suit_agnostic() {
        assert_eq!(card(0).rank(), 0);
        assert_eq!(card(13).rank(), 0);
        assert_eq!(card(51).rank(), 12);
        assert!(card(3).same_rank(card(29)));
        assert!(!card(3).same_rank(card(4)));
    }

    #[test]
    fn test_face_value_ace_high() {
        assert_eq!(card(0).face_value(), 14);
        assert_eq!(card(1).face_value(), 2);
        assert_eq!(card(12).face_value(), 13);
        assert_eq!(card(26).face_value(), 14);
    }

    #[test]
    fn test_card_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&card(37)).unwrap(), "37");
        let back: Card = serde_json::from_str("37").unwrap();
        assert_eq!(back, card(37));
    }

    #[test]
    fn test_card_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Card>("52").is_err());
    }
}
