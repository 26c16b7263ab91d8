use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomCode = String;
pub type ParticipantId = String;
pub type HintId = String;
pub type ReconnectToken = String;
pub type SpectrumId = String;

pub const ROOM_CODE_LENGTH: usize = 6;
pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 12;
pub const MAX_VOTES: usize = 2;
pub const RECENT_SPECTRUM_HISTORY: usize = 5;
pub const TARGET_MAX: u8 = 100;
pub const DEFAULT_PLACEMENT: u8 = 50;
pub const MAX_NAME_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    Lobby,
    RoundStart,
    Hint,
    Vote,
    Place,
    Reveal,
    GameOver,
}

impl RoomPhase {
    /// Phases during which only cluers may see the target
    pub fn is_secret_phase(&self) -> bool {
        matches!(self, RoomPhase::Hint | RoomPhase::Vote | RoomPhase::Place)
    }

    /// Phases the host may extend with `add_time`
    pub fn is_extendable(&self) -> bool {
        matches!(self, RoomPhase::Hint | RoomPhase::Vote | RoomPhase::Place)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: ParticipantId,
    pub name: String,
    pub avatar: String,
    pub score: u32,
    pub is_host: bool,
    /// Muted players keep playing but cannot give hints
    pub is_muted: bool,
    pub connected: bool,
    #[serde(skip_serializing)]
    pub reconnect_token: ReconnectToken,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hint {
    /// Fresh opaque id per submission so ballots never expose the author
    pub id: HintId,
    pub author_id: ParticipantId,
    pub text: String,
    pub normalized: String,
    pub canceled: bool,
    pub resubmitted: bool,
}

/// What happens to hints that normalize to the same text when hints close
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateMode {
    /// Cancel every copy; authors may resubmit once
    #[default]
    Cancel,
    /// Keep duplicates
    Allow,
}

impl std::str::FromStr for DuplicateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cancel" => Ok(DuplicateMode::Cancel),
            "allow" => Ok(DuplicateMode::Allow),
            other => Err(format!("unknown duplicate mode: {}", other)),
        }
    }
}

/// A left/right labelled axis. Supplied by the pack catalog, referenced by rooms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spectrum {
    pub id: SpectrumId,
    pub left: String,
    pub right: String,
    #[serde(skip_serializing)]
    pub banned: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum TeamTier {
    Off,
    Decent,
    Close,
    Bullseye,
}

impl TeamTier {
    pub fn from_distance(distance: u8) -> Self {
        match distance {
            0..=3 => TeamTier::Bullseye,
            4..=10 => TeamTier::Close,
            11..=24 => TeamTier::Decent,
            _ => TeamTier::Off,
        }
    }

    /// Points every participant receives for this tier
    pub fn team_points(&self) -> u32 {
        match self {
            TeamTier::Bullseye => 3,
            TeamTier::Close => 2,
            TeamTier::Decent => 1,
            TeamTier::Off => 0,
        }
    }

    pub fn navigator_bonus(&self) -> u32 {
        match self {
            TeamTier::Bullseye => 2,
            TeamTier::Close => 1,
            _ => 0,
        }
    }
}

/// Who a connection belongs to from a room's point of view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Navigator,
    Cluer,
    Observer,
}
