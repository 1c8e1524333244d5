//! The room model: seats, decks, the center pile, and the turn pointer.
//!
//! Everything here is synchronous and free of I/O. Queries are public;
//! mutations are crate-private and driven by the
//! [`GameEngine`](crate::GameEngine), which owns the timers and decides
//! what to tell clients.

use std::collections::VecDeque;

use rankwar_protocol::{Card, PlayerId, PublicPlayer, RoomSnapshot, Stage};

use crate::Dealer;

/// A seat in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    /// Front is the next card to play.
    deck: VecDeque<Card>,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            deck: VecDeque::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The player's cards, front first. Never sent over the wire.
    pub fn deck(&self) -> &VecDeque<Card> {
        &self.deck
    }

    pub fn card_count(&self) -> usize {
        self.deck.len()
    }

    /// The card this player would play next.
    pub fn top_card(&self) -> Option<Card> {
        self.deck.front().copied()
    }

    /// `false` once the player is eliminated.
    pub fn has_cards(&self) -> bool {
        !self.deck.is_empty()
    }

    fn public(&self) -> PublicPlayer {
        PublicPlayer {
            id: self.id,
            name: self.name.clone(),
            cards: self.deck.len(),
        }
    }
}

/// The outcome of one card leaving a deck for the center pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub player: PlayerId,
    pub card: Card,
    /// Cards moved from the pile into the player's deck; 0 without a
    /// capture.
    pub captured: usize,
    /// The player's deck is empty after the play.
    pub eliminated: bool,
}

/// What changed when a player left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// The leaver owned the room; ownership moved to the first seat.
    pub was_owner: bool,
    /// The leaver held the turn; it moved on.
    pub was_turn: bool,
}

/// A game room.
///
/// Invariant: while the room has players, `turn_index` indexes one of
/// them.
#[derive(Debug, Clone)]
pub struct Room {
    name: String,
    owner: PlayerId,
    players: Vec<Player>,
    turn_index: usize,
    /// Last element is the top.
    center_pile: Vec<Card>,
    stage: Stage,
    tie_breaker_card: Option<Card>,
    /// The player whose elimination started the pending tie-breaker.
    challenger: Option<PlayerId>,
}

impl Room {
    /// A new room in [`Stage::Waiting`] with its creator as owner and only
    /// player.
    pub fn new(
        name: impl Into<String>,
        owner: PlayerId,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner,
            players: vec![Player::new(owner, owner_name)],
            turn_index: 0,
            center_pile: Vec::new(),
            stage: Stage::Waiting,
            tie_breaker_card: None,
            challenger: None,
        }
    }

    // =====================================================================
    // Queries
    // =====================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn is_owner(&self, player: PlayerId) -> bool {
        self.owner == player
    }

    /// Seats in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn is_member(&self, id: PlayerId) -> bool {
        self.seat_of(id).is_some()
    }

    /// `true` if a seated player already uses `name`, ignoring case.
    pub fn name_taken(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.players.iter().any(|p| p.name.to_lowercase() == wanted)
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// The player at the turn pointer.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.turn_index)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Pile contents, bottom first.
    pub fn center_pile(&self) -> &[Card] {
        &self.center_pile
    }

    pub fn center_top(&self) -> Option<Card> {
        self.center_pile.last().copied()
    }

    pub fn tie_breaker_card(&self) -> Option<Card> {
        self.tie_breaker_card
    }

    /// Players that still hold cards.
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.has_cards()).count()
    }

    /// The only player holding cards, if there is exactly one.
    pub fn sole_survivor(&self) -> Option<&Player> {
        let mut active = self.players.iter().filter(|p| p.has_cards());
        match (active.next(), active.next()) {
            (Some(p), None) => Some(p),
            _ => None,
        }
    }

    /// Cards in all decks plus the pile.
    pub fn total_cards(&self) -> usize {
        self.center_pile.len()
            + self.players.iter().map(Player::card_count).sum::<usize>()
    }

    /// The seat that would hold the turn after the current one.
    ///
    /// Scans `turn_index + 1, turn_index + 2, ...` (wrapping) over every
    /// seat and returns the first player with cards. The current seat is
    /// checked last. Returns `turn_index` unchanged when nobody holds
    /// cards.
    pub fn next_player_index(&self) -> usize {
        let n = self.players.len();
        (1..=n)
            .map(|step| (self.turn_index + step) % n)
            .find(|&i| self.players[i].has_cards())
            .unwrap_or(self.turn_index)
    }

    /// `true` if `play` should open a tie-breaker: the player just ran
    /// out, exactly one other player still holds cards, and the room has
    /// at least two seats.
    pub fn triggers_tie_breaker(&self, play: &Play) -> bool {
        play.eliminated && self.active_count() == 1 && self.players.len() >= 2
    }

    /// The public view broadcast as `room_state`.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            name: self.name.clone(),
            owner_id: self.owner,
            players: self.players.iter().map(Player::public).collect(),
            turn_index: self.turn_index,
            center_top: self.center_top(),
            center_count: self.center_pile.len(),
            stage: self.stage,
            tie_breaker_card: self.tie_breaker_card,
        }
    }

    // =====================================================================
    // Mutations
    // =====================================================================

    fn set_stage(&mut self, stage: Stage) {
        debug_assert!(
            self.stage.can_transition_to(stage),
            "illegal stage change {} -> {}",
            self.stage,
            stage
        );
        self.stage = stage;
    }

    pub(crate) fn add_player(&mut self, id: PlayerId, name: impl Into<String>) {
        self.players.push(Player::new(id, name));
    }

    /// Hands out one deck per seat (in seat order), clears the pile and
    /// gives the turn to seat 0.
    pub(crate) fn start(&mut self, decks: impl IntoIterator<Item = Vec<Card>>) {
        for (player, deck) in self.players.iter_mut().zip(decks) {
            player.deck = deck.into();
        }
        self.center_pile.clear();
        self.tie_breaker_card = None;
        self.challenger = None;
        self.turn_index = 0;
        self.set_stage(Stage::Playing);
    }

    /// The turn holder plays their front card. A card matching the rank
    /// of the previous top captures the whole pile, played card included.
    ///
    /// Returns `None` (and changes nothing) if the turn holder has no
    /// cards.
    pub(crate) fn play_turn(&mut self) -> Option<Play> {
        let previous_top = self.center_top();
        let player = self.players.get_mut(self.turn_index)?;
        let card = player.deck.pop_front()?;
        self.center_pile.push(card);

        let mut captured = 0;
        if previous_top.is_some_and(|top| top.same_rank(card)) {
            captured = self.center_pile.len();
            player.deck.extend(self.center_pile.drain(..));
        }

        Some(Play {
            player: player.id,
            card,
            captured,
            eliminated: player.deck.is_empty(),
        })
    }

    pub(crate) fn advance_turn(&mut self) {
        self.turn_index = self.next_player_index();
    }

    pub(crate) fn enter_tie_breaker(&mut self, card: Card, challenger: Option<PlayerId>) {
        self.set_stage(Stage::TieBreaker);
        self.tie_breaker_card = Some(card);
        self.challenger = challenger;
    }

    /// Deals a shuffled copy of the pile alternately to the sole survivor
    /// and the challenger. Whoever is dealt the tie-breaker card wins the
    /// whole pile; with no match the survivor wins.
    ///
    /// A participant who has since left is skipped. Returns the winner, or
    /// `None` when neither participant is still seated.
    pub(crate) fn resolve_tie_breaker(&mut self, dealer: &mut dyn Dealer) -> Option<PlayerId> {
        let survivor = self.sole_survivor().map(Player::id);
        let challenger = self.challenger.filter(|id| self.is_member(*id));
        let participants: Vec<PlayerId> = survivor
            .into_iter()
            .chain(challenger.filter(|c| Some(*c) != survivor))
            .collect();

        self.challenger = None;
        let card = self.tie_breaker_card.take();
        let first = *participants.first()?;

        let mut shuffled = self.center_pile.clone();
        dealer.shuffle(&mut shuffled);
        let winner = shuffled
            .iter()
            .enumerate()
            .find(|(_, c)| Some(**c) == card)
            .map(|(i, _)| participants[i % participants.len()])
            .unwrap_or(first);

        let pile = std::mem::take(&mut self.center_pile);
        if let Some(seat) = self.seat_of(winner) {
            self.players[seat].deck.extend(pile);
        }
        Some(winner)
    }

    /// Back to [`Stage::Playing`] with the turn at `winner`'s seat.
    pub(crate) fn resume(&mut self, winner: PlayerId) {
        if let Some(seat) = self.seat_of(winner) {
            self.turn_index = seat;
        }
        self.set_stage(Stage::Playing);
    }

    /// Sudden death: draws one card uniformly from every card held by an
    /// active player, then picks the winner uniformly among the players
    /// holding that exact card. Moves to [`Stage::TieBreaker`] with the
    /// drawn card; no cards change hands.
    ///
    /// Returns `None` (and changes nothing) when nobody holds cards.
    pub(crate) fn sudden_death(&mut self, dealer: &mut dyn Dealer) -> Option<(Card, PlayerId)> {
        let pool: Vec<(Card, PlayerId)> = self
            .players
            .iter()
            .flat_map(|p| p.deck.iter().map(move |c| (*c, p.id)))
            .collect();
        if pool.is_empty() {
            return None;
        }
        let (decider, _) = pool[dealer.pick(pool.len())];

        let mut candidates: Vec<PlayerId> = Vec::new();
        for (card, holder) in &pool {
            if *card == decider && !candidates.contains(holder) {
                candidates.push(*holder);
            }
        }
        let winner = candidates[dealer.pick(candidates.len())];

        self.enter_tie_breaker(decider, None);
        Some((decider, winner))
    }

    pub(crate) fn finish(&mut self) {
        self.set_stage(Stage::Finished);
    }

    /// Removes a player, keeping the turn pointer on the same player when
    /// an earlier seat leaves. If the leaver held the turn it goes to the
    /// next player after their seat who still has cards.
    ///
    /// Returns `None` if the player was not seated.
    pub(crate) fn remove_player(&mut self, id: PlayerId) -> Option<Departure> {
        let seat = self.seat_of(id)?;
        let was_turn = seat == self.turn_index;
        self.players.remove(seat);

        let was_owner = self.owner == id;
        if was_owner {
            if let Some(first) = self.players.first() {
                self.owner = first.id;
            }
        }

        let n = self.players.len();
        if n == 0 {
            self.turn_index = 0;
        } else if was_turn {
            // The successor now sits at the leaver's old seat and plays
            // next; scanning from seat + 1 would skip them.
            self.turn_index = seat % n;
            if !self.players[self.turn_index].has_cards() {
                self.advance_turn();
            }
        } else if seat < self.turn_index {
            self.turn_index -= 1;
        }

        Some(Departure { was_owner, was_turn })
    }
}
