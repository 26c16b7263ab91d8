//! Server and game configuration loaded from the environment

use crate::types::DuplicateMode;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Timer lengths and game rules shared by every room
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// How long the spectrum is shown before hints open
    pub spectrum_reveal: Duration,
    pub hint: Duration,
    pub vote: Duration,
    pub place: Duration,
    /// Buffer after the reveal before the room returns to the lobby (or ends)
    pub reveal: Duration,
    /// Extra time on hint and placement phases in kids mode
    pub kids_bonus: Duration,
    /// Amount added by the host's "add time" button
    pub add_time: Duration,
    pub max_rounds: u32,
    pub win_score: u32,
    pub max_hint_chars: usize,
    pub duplicate_mode: DuplicateMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spectrum_reveal: Duration::from_secs(5),
            hint: Duration::from_secs(60),
            vote: Duration::from_secs(30),
            place: Duration::from_secs(30),
            reveal: Duration::from_secs(8),
            kids_bonus: Duration::from_secs(30),
            add_time: Duration::from_secs(15),
            max_rounds: 6,
            win_score: 15,
            max_hint_chars: 60,
            duplicate_mode: DuplicateMode::Cancel,
        }
    }
}

impl GameConfig {
    /// Load game rules from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            spectrum_reveal: env_secs("SPECTRUM_REVEAL_SECONDS", defaults.spectrum_reveal),
            hint: env_secs("HINT_SECONDS", defaults.hint),
            vote: env_secs("VOTE_SECONDS", defaults.vote),
            place: env_secs("PLACE_SECONDS", defaults.place),
            reveal: env_secs("REVEAL_SECONDS", defaults.reveal),
            kids_bonus: env_secs("KIDS_BONUS_SECONDS", defaults.kids_bonus),
            add_time: env_secs("ADD_TIME_SECONDS", defaults.add_time),
            max_rounds: env_parse("MAX_ROUNDS", defaults.max_rounds),
            win_score: env_parse("WIN_SCORE", defaults.win_score),
            max_hint_chars: env_parse("MAX_HINT_CHARS", defaults.max_hint_chars),
            duplicate_mode: env_parse("DUPLICATE_MODE", defaults.duplicate_mode),
        };

        tracing::info!(
            hint_secs = config.hint.as_secs(),
            vote_secs = config.vote.as_secs(),
            place_secs = config.place.as_secs(),
            max_rounds = config.max_rounds,
            win_score = config.win_score,
            "Game config loaded"
        );

        config
    }

    /// Hint phase length, including the kids-mode bonus
    pub fn hint_duration(&self, kids_mode: bool) -> Duration {
        self.hint + self.bonus(kids_mode)
    }

    /// Placement phase length, including the kids-mode bonus
    pub fn place_duration(&self, kids_mode: bool) -> Duration {
        self.place + self.bonus(kids_mode)
    }

    fn bonus(&self, kids_mode: bool) -> Duration {
        if kids_mode {
            self.kids_bonus
        } else {
            Duration::ZERO
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let ip = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = env_parse("PORT", 3001u16);

        Self {
            addr: SocketAddr::new(ip, port),
            game: GameConfig::from_env(),
        }
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(key, default.as_secs()))
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
