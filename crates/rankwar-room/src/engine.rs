//! The game engine: every room operation and timer reaction.
//!
//! [`GameEngine`] owns the [`RoomRegistry`], one timer slot per room, and
//! the [`Dealer`]. Each operation runs to completion, queues the events it
//! produces as [`Delivery`] values in order, and leaves the room in a
//! consistent state. The caller drains the queue with
//! [`GameEngine::take_deliveries`] and drives timers by awaiting
//! [`GameEngine::next_due`] and passing the result to
//! [`GameEngine::on_due`].
//!
//! Refused operations return a [`RoomError`] and change nothing.

use rankwar_protocol::{
    CardMultiplier, ClientConfig, ClientEvent, EmojiRelay, PlayerId, ServerEvent, Stage, Winner,
};
use rankwar_timer::{DeadlineScheduler, Due};

use crate::deck::{self, Dealer, RandomDealer};
use crate::room::{Play, Player};
use crate::{GameConfig, Room, RoomError, RoomRegistry};

/// What a room's timer slot will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTask {
    /// Skip the current player's turn.
    TurnTimeout,
    /// Autoplay plays for the current player.
    AutoplayStep,
    /// Resolve a tie-breaker opened by autoplay.
    ResolveTieBreaker,
}

/// One event addressed to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: PlayerId,
    pub event: ServerEvent,
}

/// Deliveries queued by the current operation, in emission order.
#[derive(Debug, Default)]
struct Outbox {
    queue: Vec<Delivery>,
}

impl Outbox {
    fn send(&mut self, to: PlayerId, event: ServerEvent) {
        self.queue.push(Delivery { to, event });
    }

    fn broadcast(&mut self, room: &Room, event: ServerEvent) {
        for player in room.players() {
            self.send(player.id(), event.clone());
        }
    }

    fn room_state(&mut self, room: &Room) {
        self.broadcast(room, ServerEvent::RoomState(room.snapshot()));
    }

    /// Each player privately learns their own next card.
    fn top_cards(&mut self, room: &Room) {
        for player in room.players() {
            self.send(player.id(), ServerEvent::YourTopCard(player.top_card()));
        }
    }

    fn take(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.queue)
    }
}

/// Who played the card being settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Driver {
    Player,
    Autoplay,
}

fn winner_of(player: &Player) -> Winner {
    Winner {
        winner_id: player.id(),
        winner_name: player.name().to_owned(),
    }
}

fn expect_stage(room: &Room, expected: Stage) -> Result<(), RoomError> {
    if room.stage() == expected {
        Ok(())
    } else {
        Err(RoomError::WrongStage {
            expected,
            actual: room.stage(),
        })
    }
}

fn expect_owner(room: &Room, player: PlayerId) -> Result<(), RoomError> {
    if room.is_owner(player) {
        Ok(())
    } else {
        Err(RoomError::NotOwner(player))
    }
}

/// Ends the game if exactly one player still holds cards. Only applies
/// while a game is running.
///
/// Returns `true` if the game just finished; the caller cancels the
/// room's timer.
fn settle_winner(room: &mut Room, outbox: &mut Outbox) -> bool {
    if !room.stage().in_game() {
        return false;
    }
    let Some(winner) = room.sole_survivor().map(winner_of) else {
        return false;
    };
    room.finish();
    tracing::info!(room = %room.name(), winner = %winner.winner_id, "game over");
    outbox.broadcast(room, ServerEvent::GameOver(winner));
    outbox.room_state(room);
    true
}

/// `true` once no seat holds cards. Nobody can play or win, so the
/// room's clock stops instead of cycling forever.
fn stalled(room: &Room) -> bool {
    room.stage() == Stage::Playing && room.active_count() == 0
}

/// Runs every room on a server.
pub struct GameEngine<D: Dealer = RandomDealer> {
    rooms: RoomRegistry,
    timers: DeadlineScheduler<String, RoomTask>,
    config: GameConfig,
    dealer: D,
    outbox: Outbox,
}

impl GameEngine<RandomDealer> {
    /// An engine dealing from an OS-seeded generator.
    pub fn new(config: GameConfig) -> Self {
        Self::with_dealer(config, RandomDealer::from_os_rng())
    }
}

impl<D: Dealer> GameEngine<D> {
    /// An engine that takes every random decision from `dealer`.
    pub fn with_dealer(config: GameConfig, dealer: D) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            timers: DeadlineScheduler::new(),
            config: config.validated(),
            dealer,
            outbox: Outbox::default(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn timers(&self) -> &DeadlineScheduler<String, RoomTask> {
        &self.timers
    }

    /// Drains everything queued since the last call, in emission order.
    pub fn take_deliveries(&mut self) -> Vec<Delivery> {
        self.outbox.take()
    }

    // =====================================================================
    // Connections
    // =====================================================================

    /// Greets a new connection with the server's feature flags.
    pub fn connect(&mut self, player: PlayerId) {
        let config = ClientConfig {
            dev: self.config.diagnostics,
        };
        self.outbox.send(player, ServerEvent::Config(config));
    }

    /// Removes `player` from every room they occupy.
    pub fn disconnect(&mut self, player: PlayerId) {
        for name in self.rooms.rooms_of(player) {
            if let Err(e) = self.depart(&name, player) {
                tracing::debug!(room = %name, %player, error = %e, "disconnect cleanup skipped");
            }
        }
    }

    /// Applies one client event.
    ///
    /// A user-facing refusal is also queued as `error_msg` to the sender.
    pub fn handle(&mut self, sender: PlayerId, event: ClientEvent) -> Result<(), RoomError> {
        let result = match event {
            ClientEvent::CreateRoom(e) => self.create_room(sender, &e.room_name, &e.player_name),
            ClientEvent::JoinRoom(e) => self.join_room(sender, &e.room_name, &e.player_name),
            ClientEvent::StartGame(e) => {
                let requested = e.card_multiplier.as_ref().and_then(CardMultiplier::count);
                self.start_game(sender, &e.room_name, requested)
            }
            ClientEvent::PlayCard(r) => self.play_card(sender, &r.room_name),
            ClientEvent::DebugAutoplay(r) => self.start_autoplay(sender, &r.room_name),
            ClientEvent::ForceTiebreaker(r) => self.force_tie_breaker(sender, &r.room_name),
            ClientEvent::SendEmoji(e) => {
                self.send_emoji(sender, &e.room_name, &e.emoji, &e.player_name)
            }
            ClientEvent::LeaveRoom(r) => self.leave_room(sender, &r.room_name),
        };
        if let Err(e) = &result {
            if e.is_user_facing() {
                self.outbox.send(sender, ServerEvent::ErrorMsg(e.to_string()));
            }
        }
        result
    }

    // =====================================================================
    // Lobby
    // =====================================================================

    /// Creates a room in `waiting` with `sender` as owner.
    pub fn create_room(
        &mut self,
        sender: PlayerId,
        room_name: &str,
        player_name: &str,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .create(room_name.trim(), sender, player_name.trim())?;
        self.outbox.room_state(room);
        Ok(())
    }

    /// Seats `sender` in a waiting room.
    pub fn join_room(
        &mut self,
        sender: PlayerId,
        room_name: &str,
        player_name: &str,
    ) -> Result<(), RoomError> {
        let room_name = room_name.trim();
        let player_name = player_name.trim();
        let room = self
            .rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::RoomNotFound(room_name.to_owned()))?;
        if room.stage() != Stage::Waiting {
            return Err(RoomError::GameStarted(room_name.to_owned()));
        }
        if room.is_member(sender) {
            return Err(RoomError::AlreadyInRoom(sender));
        }
        if room.name_taken(player_name) {
            return Err(RoomError::NameTaken(player_name.to_owned()));
        }

        room.add_player(sender, player_name);
        tracing::info!(room = %room_name, player = %sender, name = %player_name, "player joined");
        self.outbox.room_state(room);
        Ok(())
    }

    /// Deals every seat a deck and starts turns at seat 0.
    ///
    /// `requested` is the client's base deck size; see
    /// [`deck::base_count`] for how it is defaulted and clamped.
    pub fn start_game(
        &mut self,
        sender: PlayerId,
        room_name: &str,
        requested: Option<i64>,
    ) -> Result<(), RoomError> {
        let room_name = room_name.trim();
        let room = self
            .rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NoSuchRoom(room_name.to_owned()))?;
        expect_owner(room, sender)?;
        expect_stage(room, Stage::Waiting)?;

        let base = deck::base_count(requested, &self.config);
        let decks: Vec<_> = room
            .players()
            .iter()
            .map(|_| self.dealer.deal(base))
            .collect();
        room.start(decks);
        tracing::info!(
            room = %room_name,
            players = room.players().len(),
            base,
            cards = room.total_cards(),
            "game started"
        );

        self.outbox.room_state(room);
        self.outbox.top_cards(room);
        self.timers.arm(
            room_name.to_owned(),
            self.config.turn_timeout,
            RoomTask::TurnTimeout,
        );
        Ok(())
    }

    /// Relays an emoji to everyone in the room.
    pub fn send_emoji(
        &mut self,
        sender: PlayerId,
        room_name: &str,
        emoji: &str,
        player_name: &str,
    ) -> Result<(), RoomError> {
        let room_name = room_name.trim();
        let room = self
            .rooms
            .get(room_name)
            .ok_or_else(|| RoomError::NoSuchRoom(room_name.to_owned()))?;
        tracing::trace!(room = %room_name, player = %sender, "emoji");
        let relay = EmojiRelay {
            emoji: emoji.to_owned(),
            player_name: player_name.to_owned(),
        };
        self.outbox.broadcast(room, ServerEvent::Emoji(relay));
        Ok(())
    }

    /// Removes `sender` from one room.
    pub fn leave_room(&mut self, sender: PlayerId, room_name: &str) -> Result<(), RoomError> {
        self.depart(room_name.trim(), sender)
    }

    fn depart(&mut self, room_name: &str, player: PlayerId) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NoSuchRoom(room_name.to_owned()))?;
        let departure = room
            .remove_player(player)
            .ok_or(RoomError::NotInRoom(player))?;
        tracing::info!(
            room = %room_name,
            %player,
            was_owner = departure.was_owner,
            was_turn = departure.was_turn,
            "player left"
        );

        if room.players().is_empty() {
            self.timers.cancel(&room_name.to_owned());
            self.rooms.remove(room_name);
            return Ok(());
        }

        self.outbox.room_state(room);
        if settle_winner(room, &mut self.outbox) {
            self.timers.cancel(&room_name.to_owned());
        } else if stalled(room) {
            self.timers.cancel(&room_name.to_owned());
        } else if departure.was_turn && room.stage() == Stage::Playing {
            self.timers.arm(
                room_name.to_owned(),
                self.config.turn_timeout,
                RoomTask::TurnTimeout,
            );
        }
        Ok(())
    }

    // =====================================================================
    // Play
    // =====================================================================

    /// The turn holder plays their front card.
    pub fn play_card(&mut self, sender: PlayerId, room_name: &str) -> Result<(), RoomError> {
        let room_name = room_name.trim();
        let room = self
            .rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NoSuchRoom(room_name.to_owned()))?;
        expect_stage(room, Stage::Playing)?;
        if room.current_player().map(Player::id) != Some(sender) {
            return Err(RoomError::NotYourTurn(sender));
        }
        let play = room.play_turn().ok_or(RoomError::OutOfCards(sender))?;
        self.settle_play(room_name, play, Driver::Player);
        Ok(())
    }

    /// Everything that follows a card hitting the pile: a tie-breaker, or
    /// the turn advancing and the timer being re-armed.
    fn settle_play(&mut self, room_name: &str, play: Play, driver: Driver) {
        let Some(room) = self.rooms.get_mut(room_name) else {
            return;
        };
        tracing::debug!(
            room = %room_name,
            player = %play.player,
            card = %play.card,
            captured = play.captured,
            ?driver,
            "card played"
        );
        let key = room_name.to_owned();

        if room.triggers_tie_breaker(&play) {
            room.enter_tie_breaker(play.card, Some(play.player));
            self.timers.cancel(&key);
            tracing::info!(
                room = %room_name,
                challenger = %play.player,
                card = %play.card,
                "tie-breaker"
            );
            self.outbox.room_state(room);
            match driver {
                Driver::Autoplay => {
                    self.outbox.top_cards(room);
                    self.timers
                        .arm(key, self.config.tie_breaker_delay, RoomTask::ResolveTieBreaker);
                }
                Driver::Player => self.resolve_tie_breaker(room_name),
            }
            return;
        }

        room.advance_turn();
        self.outbox.room_state(room);
        self.outbox.top_cards(room);
        if settle_winner(room, &mut self.outbox) {
            self.timers.cancel(&key);
            return;
        }
        if stalled(room) {
            tracing::debug!(room = %room_name, "no cards left in play, stopping the clock");
            self.timers.cancel(&key);
            return;
        }

        match driver {
            Driver::Autoplay if play.captured == 0 => {
                self.timers
                    .arm(key, self.config.autoplay_delay, RoomTask::AutoplayStep);
            }
            _ => {
                self.timers
                    .arm(key, self.config.turn_timeout, RoomTask::TurnTimeout);
            }
        }
    }

    fn resolve_tie_breaker(&mut self, room_name: &str) {
        let Some(room) = self.rooms.get_mut(room_name) else {
            return;
        };
        if room.stage() != Stage::TieBreaker {
            tracing::debug!(room = %room_name, stage = %room.stage(), "no tie-breaker to resolve");
            return;
        }
        let key = room_name.to_owned();

        let Some(winner) = room.resolve_tie_breaker(&mut self.dealer) else {
            tracing::warn!(room = %room_name, "tie-breaker has no participants left");
            room.finish();
            self.timers.cancel(&key);
            self.outbox.room_state(room);
            return;
        };
        let Some(result) = room.player(winner).map(winner_of) else {
            return;
        };
        tracing::info!(room = %room_name, winner = %winner, "tie-breaker resolved");
        self.outbox.broadcast(room, ServerEvent::TiebreakerResult(result));

        if settle_winner(room, &mut self.outbox) {
            self.timers.cancel(&key);
            return;
        }
        room.resume(winner);
        self.outbox.room_state(room);
        self.outbox.top_cards(room);
        self.timers
            .arm(key, self.config.turn_timeout, RoomTask::TurnTimeout);
    }

    /// Sudden death: picks a winner from a random card still in play and
    /// ends the game. Play never resumes.
    pub fn force_tie_breaker(&mut self, sender: PlayerId, room_name: &str) -> Result<(), RoomError> {
        let room_name = room_name.trim();
        let room = self
            .rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NoSuchRoom(room_name.to_owned()))?;
        expect_owner(room, sender)?;
        expect_stage(room, Stage::Playing)?;

        let (card, winner) = room
            .sudden_death(&mut self.dealer)
            .ok_or(RoomError::NoCardsInPlay)?;
        let result = room
            .player(winner)
            .map(winner_of)
            .ok_or(RoomError::NotInRoom(winner))?;
        self.timers.cancel(&room_name.to_owned());
        tracing::info!(room = %room_name, %card, %winner, "sudden death");

        self.outbox.room_state(room);
        self.outbox
            .broadcast(room, ServerEvent::TiebreakerResult(result.clone()));
        room.finish();
        tracing::info!(room = %room_name, %winner, "game over");
        self.outbox.broadcast(room, ServerEvent::GameOver(result));
        self.outbox.room_state(room);
        Ok(())
    }

    // =====================================================================
    // Autoplay
    // =====================================================================

    /// Plays for whoever holds the turn, on a fixed delay, until a capture,
    /// a tie-breaker, the end of the game, or anything else re-arming the
    /// room's timer.
    pub fn start_autoplay(&mut self, sender: PlayerId, room_name: &str) -> Result<(), RoomError> {
        if !self.config.diagnostics {
            return Err(RoomError::DiagnosticsDisabled);
        }
        let room_name = room_name.trim();
        let room = self
            .rooms
            .get(room_name)
            .ok_or_else(|| RoomError::NoSuchRoom(room_name.to_owned()))?;
        expect_owner(room, sender)?;
        expect_stage(room, Stage::Playing)?;

        tracing::info!(room = %room_name, "autoplay engaged");
        self.timers.cancel(&room_name.to_owned());
        self.autoplay_step(room_name);
        Ok(())
    }

    fn autoplay_step(&mut self, room_name: &str) {
        let Some(room) = self.rooms.get_mut(room_name) else {
            return;
        };
        if room.stage() != Stage::Playing {
            return;
        }
        if stalled(room) {
            tracing::debug!(room = %room_name, "no cards left in play, autoplay stopped");
            self.timers.cancel(&room_name.to_owned());
            return;
        }
        match room.play_turn() {
            Some(play) => self.settle_play(room_name, play, Driver::Autoplay),
            None => {
                // Stale pointer at an empty deck: move on and retry.
                room.advance_turn();
                self.outbox.room_state(room);
                self.timers.arm(
                    room_name.to_owned(),
                    self.config.autoplay_delay,
                    RoomTask::AutoplayStep,
                );
            }
        }
    }

    // =====================================================================
    // Timers
    // =====================================================================

    fn skip_turn(&mut self, room_name: &str) {
        let Some(room) = self.rooms.get_mut(room_name) else {
            return;
        };
        if room.stage() != Stage::Playing {
            return;
        }
        if stalled(room) {
            tracing::debug!(room = %room_name, "no cards left in play, turn clock stopped");
            self.timers.cancel(&room_name.to_owned());
            return;
        }
        if let Some(player) = room.current_player() {
            tracing::debug!(room = %room_name, player = %player.id(), "turn timed out");
            self.outbox.send(player.id(), ServerEvent::TurnTimeout);
        }
        room.advance_turn();
        self.outbox.room_state(room);
        self.timers.arm(
            room_name.to_owned(),
            self.config.turn_timeout,
            RoomTask::TurnTimeout,
        );
    }

    /// Waits for the next room timer to fire. Cancel-safe; pends forever
    /// while no timer is armed.
    pub async fn next_due(&mut self) -> Due<String, RoomTask> {
        self.timers.next_due().await
    }

    /// Runs a fired timer. Each task re-checks that its room still exists
    /// and is in the right stage.
    pub fn on_due(&mut self, due: Due<String, RoomTask>) {
        tracing::trace!(
            room = %due.key,
            task = ?due.task,
            late_ms = due.late_by.as_millis() as u64,
            "room timer fired"
        );
        match due.task {
            RoomTask::TurnTimeout => self.skip_turn(&due.key),
            RoomTask::AutoplayStep => self.autoplay_step(&due.key),
            RoomTask::ResolveTieBreaker => self.resolve_tie_breaker(&due.key),
        }
    }
}

impl Default for GameEngine<RandomDealer> {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
