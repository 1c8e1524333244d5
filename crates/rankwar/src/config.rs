//! Server configuration and its environment overrides.

use rankwar_room::GameConfig;
use serde::{Deserialize, Serialize};

/// Address used when neither `RANKWAR_BIND` nor `PORT` is set.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Everything needed to start a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind: String,

    /// Game rules shared by every room, including the diagnostics flag.
    pub game: GameConfig,

    /// Capacity of the command channel feeding the game actor.
    pub channel_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            game: GameConfig {
                diagnostics: true,
                ..GameConfig::default()
            },
            channel_size: 256,
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the process environment.
    ///
    /// - `RANKWAR_BIND`: full bind address.
    /// - `PORT`: binds `0.0.0.0:$PORT` when `RANKWAR_BIND` is unset.
    /// - `RANKWAR_ENV=production`: turns diagnostics off.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(bind) = lookup("RANKWAR_BIND").filter(|b| !b.trim().is_empty()) {
            config.bind = bind.trim().to_string();
        } else if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.bind = format!("0.0.0.0:{port}"),
                Err(_) => tracing::warn!(%port, "ignoring invalid PORT"),
            }
        }
        if lookup("RANKWAR_ENV").is_some_and(|env| env.trim() == "production") {
            config.game.diagnostics = false;
        }
        config
    }

    /// Clamps out-of-range values, warning about each.
    pub fn validated(mut self) -> Self {
        if self.channel_size == 0 {
            tracing::warn!("channel_size is 0, clamping to 1");
            self.channel_size = 1;
        }
        self.game = self.game.validated();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind, DEFAULT_BIND);
        assert!(config.game.diagnostics);
    }

    #[test]
    fn test_port_sets_bind_address() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")]));
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_explicit_bind_wins_over_port() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("RANKWAR_BIND", "127.0.0.1:9000"),
        ]));
        assert_eq!(config.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        assert_eq!(config.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_production_disables_diagnostics() {
        let config = ServerConfig::from_lookup(lookup(&[("RANKWAR_ENV", "production")]));
        assert!(!config.game.diagnostics);
    }

    #[test]
    fn test_validated_clamps_channel_size() {
        let config = ServerConfig {
            channel_size: 0,
            ..ServerConfig::default()
        }
        .validated();
        assert_eq!(config.channel_size, 1);
    }
}
