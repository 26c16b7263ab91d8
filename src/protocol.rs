use crate::error::{ErrorKind, RoomError};
use crate::state::score::RoundResult;
use crate::state::view::{HintView, RoomView};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom {
        code: RoomCode,
        name: String,
        #[serde(default)]
        avatar: String,
    },
    Reconnect {
        token: ReconnectToken,
    },
    StartRound {
        code: RoomCode,
    },
    SubmitHint {
        code: RoomCode,
        text: String,
    },
    CompleteHintPhase {
        code: RoomCode,
    },
    SubmitVote {
        code: RoomCode,
        hint_ids: Vec<HintId>,
    },
    CompleteVotePhase {
        code: RoomCode,
    },
    SetPlacement {
        code: RoomCode,
        value: f64,
    },
    LockPlacement {
        code: RoomCode,
    },
    ToggleKidsMode {
        code: RoomCode,
    },
    ToggleStreamerMode {
        code: RoomCode,
    },
    SetPack {
        code: RoomCode,
        pack: String,
    },
    AddTime {
        code: RoomCode,
    },
    KickPlayer {
        code: RoomCode,
        player_id: ParticipantId,
    },
    MutePlayer {
        code: RoomCode,
        player_id: ParticipantId,
    },
    GetState {
        code: RoomCode,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        participant_id: ParticipantId,
    },
    RoomCreated {
        code: RoomCode,
        /// Lets the host display resume after a refresh
        reconnect_token: ReconnectToken,
    },
    JoinConfirmed {
        code: RoomCode,
        participant_id: ParticipantId,
        reconnect_token: ReconnectToken,
    },
    ReconnectConfirmed {
        code: RoomCode,
        participant_id: ParticipantId,
    },
    RoomState {
        state: RoomView,
    },
    RoundStarted {
        round: u32,
        navigator_id: Option<ParticipantId>,
        spectrum: Option<Spectrum>,
        deadline: Option<String>,
    },
    HintPhaseStarted {
        deadline: Option<String>,
    },
    HintAccepted {
        hint_id: HintId,
        resubmitted: bool,
    },
    HintRejected {
        code: String,
        kind: ErrorKind,
        reason: String,
    },
    HintCanceled {
        hint_id: HintId,
        text: String,
        reason: String,
    },
    HintStatus {
        submitted: usize,
        total: usize,
    },
    VotePhaseStarted {
        hints: Vec<HintView>,
        max_votes: usize,
        deadline: Option<String>,
    },
    VoteAccepted {
        hint_ids: Vec<HintId>,
    },
    VoteRejected {
        code: String,
        kind: ErrorKind,
        reason: String,
    },
    VoteStatus {
        voted: usize,
        total: usize,
    },
    PlacementAccepted {
        value: u8,
    },
    PlacementPhaseStarted {
        final_clues: Vec<HintView>,
        deadline: Option<String>,
    },
    Reveal {
        #[serde(flatten)]
        result: RoundResult,
    },
    RoundComplete {
        round: u32,
        leaderboard: Vec<Player>,
    },
    GameOver {
        leaderboard: Vec<Player>,
    },
    TimeExtended {
        deadline: String,
    },
    PackUpdated {
        pack: String,
    },
    Kicked {
        code: RoomCode,
    },
    Error {
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<ErrorKind>,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            kind: None,
            msg: msg.into(),
        }
    }

    pub fn hint_rejected(err: &RoomError) -> Self {
        ServerMessage::HintRejected {
            code: err.code().to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    pub fn vote_rejected(err: &RoomError) -> Self {
        ServerMessage::VoteRejected {
            code: err.code().to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

impl From<RoomError> for ServerMessage {
    fn from(err: RoomError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            kind: Some(err.kind()),
            msg: err.to_string(),
        }
    }
}
