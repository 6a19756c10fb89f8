//! Engine configuration, read from the environment at startup.

use std::env;

use crate::error::AppError;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_NUM_PLAYERS: usize = 4;
const DEFAULT_TRADING_DURATION_SECS: u64 = 240;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// HTTP listen port (`PORT`, default 5000).
    pub port: u16,
    /// Lobby size that starts a round (`NUM_PLAYERS`, 4 or 5, default 4).
    pub num_players: usize,
    /// Real trading duration in milliseconds (`TRADING_DURATION` seconds,
    /// default 240).
    pub duration_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            num_players: DEFAULT_NUM_PLAYERS,
            duration_ms: DEFAULT_TRADING_DURATION_SECS * 1_000,
        }
    }
}

impl GameConfig {
    /// Loads and validates the configuration. Startup fails on invalid
    /// values rather than trading under a misconfigured clock or lobby.
    pub fn from_env() -> Result<Self, AppError> {
        let port = read_parsed("PORT", DEFAULT_PORT)?;
        let num_players = read_parsed("NUM_PLAYERS", DEFAULT_NUM_PLAYERS)?;
        if !(num_players == 4 || num_players == 5) {
            return Err(AppError::config("NUM_PLAYERS must be 4 or 5"));
        }
        let duration_secs: u64 = read_parsed("TRADING_DURATION", DEFAULT_TRADING_DURATION_SECS)?;
        if duration_secs == 0 {
            return Err(AppError::config("TRADING_DURATION must be positive"));
        }
        Ok(Self {
            port,
            num_players,
            duration_ms: duration_secs * 1_000,
        })
    }
}

fn read_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} has an invalid value: {raw}"))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(AppError::config(format!("{key}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = GameConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.num_players, 4);
        assert_eq!(config.duration_ms, 240_000);
    }
}
