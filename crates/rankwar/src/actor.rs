//! The game actor: one Tokio task that owns every room.
//!
//! Connection handlers forward decoded events over an mpsc channel. The
//! actor applies them to the [`GameEngine`] one at a time, fires room
//! timers from the same `select!` loop, and hands each resulting event to
//! the recipient's outbound channel in the order the engine produced it.

use std::collections::HashMap;

use rankwar_protocol::{ClientEvent, PlayerId, ServerEvent};
use rankwar_room::{Dealer, GameEngine};
use tokio::sync::mpsc;

/// Channel sender for delivering outbound events to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the game actor.
#[derive(Debug)]
pub(crate) enum Command {
    /// A connection opened.
    Connect {
        player: PlayerId,
        outbound: PlayerSender,
    },

    /// A decoded, validated client event.
    Event { player: PlayerId, event: ClientEvent },

    /// A connection closed.
    Disconnect { player: PlayerId },
}

pub(crate) struct GameActor<D: Dealer> {
    engine: GameEngine<D>,
    outbound: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<Command>,
}

/// Starts the actor and returns the sender that feeds it. The actor stops
/// once every sender is dropped.
pub(crate) fn spawn_actor<D: Dealer>(
    engine: GameEngine<D>,
    channel_size: usize,
) -> mpsc::Sender<Command> {
    let (sender, receiver) = mpsc::channel(channel_size.max(1));
    let actor = GameActor {
        engine,
        outbound: HashMap::new(),
        receiver,
    };
    tokio::spawn(actor.run());
    sender
}

impl<D: Dealer> GameActor<D> {
    async fn run(mut self) {
        tracing::info!("game actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                due = self.engine.next_due() => self.engine.on_due(due),
            }
            self.flush();
        }

        tracing::info!(rooms = self.engine.rooms().len(), "game actor stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { player, outbound } => {
                self.outbound.insert(player, outbound);
                self.engine.connect(player);
            }
            Command::Event { player, event } => {
                let name = event.name();
                if let Err(e) = self.engine.handle(player, event) {
                    tracing::debug!(
                        %player,
                        event = name,
                        error = %e,
                        user_facing = e.is_user_facing(),
                        "event refused"
                    );
                }
            }
            Command::Disconnect { player } => {
                self.outbound.remove(&player);
                self.engine.disconnect(player);
            }
        }
    }

    /// Hands queued deliveries to their connections. Events for a player
    /// whose connection is gone are dropped.
    fn flush(&mut self) {
        for delivery in self.engine.take_deliveries() {
            let Some(sender) = self.outbound.get(&delivery.to) else {
                continue;
            };
            if sender.send(delivery.event).is_err() {
                tracing::trace!(player = %delivery.to, "outbound channel closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rankwar_protocol::{ClientConfig, RoomEntry};
    use rankwar_room::GameConfig;

    use super::*;

    #[tokio::test]
    async fn test_actor_answers_through_outbound_channels() {
        let commands = spawn_actor(GameEngine::new(GameConfig::default()), 8);
        let (tx, mut rx) = mpsc::unbounded_channel();

        commands
            .send(Command::Connect {
                player: PlayerId(1),
                outbound: tx,
            })
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            ServerEvent::Config(ClientConfig { dev: false })
        );

        commands
            .send(Command::Event {
                player: PlayerId(1),
                event: ClientEvent::CreateRoom(RoomEntry {
                    room_name: "A".into(),
                    player_name: "ann".into(),
                }),
            })
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            ServerEvent::RoomState(state) => assert_eq!(state.owner_id, PlayerId(1)),
            other => panic!("expected RoomState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disconnect_drops_outbound_channel() {
        let commands = spawn_actor(GameEngine::new(GameConfig::default()), 8);
        let (tx, mut rx) = mpsc::unbounded_channel();

        commands
            .send(Command::Connect {
                player: PlayerId(1),
                outbound: tx,
            })
            .await
            .unwrap();
        rx.recv().await.unwrap();

        commands
            .send(Command::Disconnect { player: PlayerId(1) })
            .await
            .unwrap();
        assert_eq!(rx.recv().await, None);
    }
}
