//! Per-connection handler: the event gateway.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Derive the `PlayerId` from the connection and register an
//!      outbound channel with the game actor
//!   2. Loop: decode inbound frames into client events and forward them,
//!      while writing everything the actor sends back
//!   3. On exit, close the socket and tell the actor the player
//!      disconnected

use rankwar_protocol::{ClientEvent, Codec, PlayerId};
use rankwar_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::RankwarError;
use crate::actor::Command;

/// Drop guard that reports the disconnect when the handler exits.
///
/// `Drop` is synchronous, so the send runs in a fire-and-forget task.
struct ConnectionGuard {
    player: PlayerId,
    commands: mpsc::Sender<Command>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let player = self.player;
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let _ = commands.send(Command::Disconnect { player }).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    commands: mpsc::Sender<Command>,
    codec: C,
) -> Result<(), RankwarError> {
    let conn_id = conn.id();
    let player = PlayerId(conn_id.into_inner());

    let (outbound, mut events) = mpsc::unbounded_channel();
    commands
        .send(Command::Connect { player, outbound })
        .await
        .map_err(|_| RankwarError::ActorStopped)?;
    let _guard = ConnectionGuard {
        player,
        commands: commands.clone(),
    };
    tracing::info!(%conn_id, peer = %conn.peer_addr(), %player, "player connected");

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player, error = %e, "recv error");
                        break;
                    }
                };
                let Some(event) = decode_event(&codec, player, &data) else {
                    continue;
                };
                commands
                    .send(Command::Event { player, event })
                    .await
                    .map_err(|_| RankwarError::ActorStopped)?;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let bytes = codec.encode(&event)?;
                conn.send(&bytes).await?;
            }
        }
    }

    // Flushes the close handshake so the client gets a close frame.
    if let Err(e) = conn.close().await {
        tracing::trace!(%player, error = %e, "close failed");
    }

    // _guard drops here → disconnect reaches the actor.
    Ok(())
}

/// Decodes and validates one inbound frame. Malformed frames are logged
/// and dropped.
fn decode_event<C: Codec>(codec: &C, player: PlayerId, data: &[u8]) -> Option<ClientEvent> {
    let event: ClientEvent = match codec.decode(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(%player, error = %e, "failed to decode event");
            return None;
        }
    };
    if let Err(e) = event.validate() {
        tracing::debug!(%player, error = %e, "dropping invalid event");
        return None;
    }
    Some(event)
}

#[cfg(test)]
mod tests {
    use rankwar_protocol::JsonCodec;

    use super::*;

    #[test]
    fn test_decode_event_accepts_known_event() {
        let event = decode_event(
            &JsonCodec,
            PlayerId(1),
            br#"{"event":"play_card","data":{"roomName":"A"}}"#,
        );
        assert!(matches!(event, Some(ClientEvent::PlayCard(_))));
    }

    #[test]
    fn test_decode_event_drops_garbage_and_unknown_events() {
        assert!(decode_event(&JsonCodec, PlayerId(1), b"not json").is_none());
        assert!(
            decode_event(&JsonCodec, PlayerId(1), br#"{"event":"cheat","data":{}}"#).is_none()
        );
    }

    #[test]
    fn test_decode_event_drops_blank_names() {
        let event = decode_event(
            &JsonCodec,
            PlayerId(1),
            br#"{"event":"create_room","data":{"roomName":"A","playerName":"  "}}"#,
        );
        assert!(event.is_none());
    }
}
