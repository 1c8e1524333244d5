//! `RankwarServer` builder and accept loop.
//!
//! This is the entry point for running a rankwar server. It ties the
//! layers together: transport → handler → game actor → engine.

use rankwar_protocol::{Codec, JsonCodec};
use rankwar_room::{GameConfig, GameEngine};
use rankwar_transport::{Transport, TransportError, WebSocketTransport};
use tokio::sync::mpsc;

use crate::RankwarError;
use crate::ServerConfig;
use crate::actor::{Command, spawn_actor};
use crate::handler::handle_connection;

/// Builder for configuring and starting a rankwar server.
///
/// # Example
///
/// ```rust,no_run
/// use rankwar::prelude::*;
///
/// # async fn start() -> Result<(), RankwarError> {
/// let server = RankwarServer::builder()
///     .bind("0.0.0.0:3000")
///     .diagnostics(false)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RankwarServerBuilder {
    config: ServerConfig,
}

impl RankwarServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from a complete configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Turns diagnostics (the `dev` flag and autoplay) on or off.
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.config.game.diagnostics = enabled;
        self
    }

    /// Replaces the game rules. Keeps the diagnostics setting.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        let diagnostics = self.config.game.diagnostics;
        self.config.game = GameConfig {
            diagnostics,
            ..game
        };
        self
    }

    /// Sets the capacity of the game actor's command channel.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.config.channel_size = size;
        self
    }

    /// Binds the listener and starts the game actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<RankwarServer<JsonCodec>, RankwarError> {
        let config = self.config.validated();
        let transport = WebSocketTransport::bind(&config.bind).await?;
        let commands = spawn_actor(GameEngine::new(config.game.clone()), config.channel_size);
        tracing::info!(
            diagnostics = config.game.diagnostics,
            turn_timeout_ms = config.game.turn_timeout.as_millis() as u64,
            "rankwar server built"
        );

        Ok(RankwarServer {
            transport,
            commands,
            codec: JsonCodec,
        })
    }
}

impl Default for RankwarServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running rankwar server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RankwarServer<C: Codec> {
    transport: WebSocketTransport,
    commands: mpsc::Sender<Command>,
    codec: C,
}

impl RankwarServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RankwarServerBuilder {
        RankwarServerBuilder::new()
    }
}

impl<C> RankwarServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), RankwarError> {
        tracing::info!("rankwar server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let commands = self.commands.clone();
                    let codec = self.codec.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, commands, codec).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e @ TransportError::Handshake { .. }) => {
                    tracing::debug!(error = %e, "client dropped during handshake");
                }
                Err(e) if e.is_per_client() => {
                    tracing::warn!(error = %e, "accept failed");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
