use crate::types::RoomPhase;
use serde::Serialize;

/// Coarse error classes reported to clients and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidPhase,
    ValidationFailed,
    ContentRejected,
    Capacity,
}

/// Failure of a room operation. Room state is never mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    #[error("Game not found")]
    RoomNotFound,

    #[error("Player not found")]
    PlayerNotFound,

    #[error("Invalid reconnect token")]
    UnknownToken,

    #[error("Unknown or canceled hint: {0}")]
    InvalidHint(String),

    #[error("Only the host can {0}")]
    NotHost(&'static str),

    #[error("Only the navigator can do that")]
    NotNavigator,

    #[error("The navigator cannot do that")]
    NavigatorNotAllowed,

    #[error("Not allowed during {0:?}")]
    InvalidPhase(RoomPhase),

    #[error("You can vote for at most {max} hints")]
    TooManyVotes { max: usize },

    #[error("You cannot vote for your own hint")]
    SelfVote,

    #[error("You voted for the same hint twice")]
    DuplicateVote,

    #[error("Pick at least one hint")]
    EmptyBallot,

    #[error("Value must be between 0 and 100")]
    OutOfRange,

    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Text is longer than {max} characters")]
    TextTooLong { max: usize },

    #[error("You already replaced your hint once")]
    AlreadyResubmitted,

    #[error("Unknown spectrum pack: {0}")]
    UnknownPack(String),

    #[error("Keep it friendly")]
    Profane,

    #[error("\"{0}\" is not allowed for this spectrum")]
    BannedWord(String),

    #[error("Game is full")]
    RoomFull,

    #[error("Need at least {min} players, have {have}")]
    NotEnoughPlayers { min: usize, have: usize },

    #[error("No running timer to extend")]
    NoActiveTimer,

    #[error("The host cannot kick themselves")]
    CannotKickHost,

    #[error("The host cannot mute themselves")]
    CannotMuteHost,

    #[error("The host muted you")]
    Muted,
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        use RoomError::*;

        match self {
            RoomNotFound | PlayerNotFound | UnknownToken | InvalidHint(_) => ErrorKind::NotFound,
            NotHost(_) | NotNavigator | NavigatorNotAllowed | CannotKickHost | CannotMuteHost
            | Muted => {
                ErrorKind::Forbidden
            }
            InvalidPhase(_) | NoActiveTimer => ErrorKind::InvalidPhase,
            TooManyVotes { .. } | SelfVote | DuplicateVote | EmptyBallot | OutOfRange
            | EmptyText | TextTooLong { .. } | AlreadyResubmitted | UnknownPack(_) => {
                ErrorKind::ValidationFailed
            }
            Profane | BannedWord(_) => ErrorKind::ContentRejected,
            RoomFull | NotEnoughPlayers { .. } => ErrorKind::Capacity,
        }
    }

    /// Stable wire code for error events
    pub fn code(&self) -> &'static str {
        use RoomError::*;

        match self {
            RoomNotFound => "ROOM_NOT_FOUND",
            PlayerNotFound => "PLAYER_NOT_FOUND",
            UnknownToken => "UNKNOWN_TOKEN",
            InvalidHint(_) => "INVALID_HINT",
            NotHost(_) => "NOT_HOST",
            NotNavigator => "NOT_NAVIGATOR",
            NavigatorNotAllowed => "NAVIGATOR_NOT_ALLOWED",
            InvalidPhase(_) => "INVALID_PHASE",
            TooManyVotes { .. } => "TOO_MANY_VOTES",
            SelfVote => "SELF_VOTE",
            DuplicateVote => "DUPLICATE_VOTE",
            EmptyBallot => "EMPTY_BALLOT",
            OutOfRange => "OUT_OF_RANGE",
            EmptyText => "EMPTY_TEXT",
            TextTooLong { .. } => "TEXT_TOO_LONG",
            AlreadyResubmitted => "ALREADY_RESUBMITTED",
            UnknownPack(_) => "UNKNOWN_PACK",
            Profane => "PROFANE",
            BannedWord(_) => "BANNED_WORD",
            RoomFull => "ROOM_FULL",
            NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            NoActiveTimer => "NO_ACTIVE_TIMER",
            CannotKickHost => "CANNOT_KICK_HOST",
            CannotMuteHost => "CANNOT_MUTE_HOST",
            Muted => "MUTED",
        }
    }
}
