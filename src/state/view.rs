//! Per-recipient room snapshots
//!
//! Every outbound snapshot is built for one recipient, since what a recipient
//! may see depends on who they are: the target stays hidden from the navigator
//! and the host until the reveal, ballots stay anonymous until the reveal, and
//! streamer mode masks other players' names on controllers.

use super::room::Room;
use super::score::RoundResult;
use crate::types::*;
use serde::Serialize;

const MASKED_NAME: &str = "***";

/// A hint as shown to clients. `author_id` is only filled in once authorship is public.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HintView {
    pub id: HintId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<ParticipantId>,
    pub canceled: bool,
}

impl HintView {
    pub fn anonymous(hint: &Hint) -> Self {
        Self {
            id: hint.id.clone(),
            text: hint.text.clone(),
            author_id: None,
            canceled: hint.canceled,
        }
    }

    pub fn attributed(hint: &Hint) -> Self {
        Self {
            author_id: Some(hint.author_id.clone()),
            ..Self::anonymous(hint)
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomView {
    pub code: RoomCode,
    pub phase: RoomPhase,
    pub round: u32,
    pub max_rounds: u32,
    pub win_score: u32,
    pub host_id: ParticipantId,
    pub navigator_id: Option<ParticipantId>,
    pub spectrum: Option<Spectrum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u8>,
    pub placement: Option<u8>,
    pub kids_mode: bool,
    pub streamer_mode: bool,
    pub duplicate_mode: DuplicateMode,
    pub pack: String,
    /// RFC 3339 deadline of the running phase timer
    pub deadline: Option<String>,
    pub players: Vec<Player>,
    pub hints: Vec<HintView>,
    pub final_clues: Vec<HintId>,
    pub result: Option<RoundResult>,
    pub hints_submitted: usize,
    pub votes_cast: usize,
    pub you: ParticipantId,
    pub your_role: Role,
    pub your_hint: Option<HintView>,
}

/// Build the snapshot `viewer` is allowed to see
pub fn build_view(room: &Room, viewer: &str) -> RoomView {
    RoomView {
        code: room.code.clone(),
        phase: room.phase,
        round: room.round,
        max_rounds: room.max_rounds,
        win_score: room.win_score,
        host_id: room.host_id.clone(),
        navigator_id: room.navigator_id.clone(),
        spectrum: room.spectrum.clone(),
        target: visible_target(room, viewer),
        placement: match room.phase {
            RoomPhase::Place | RoomPhase::Reveal | RoomPhase::GameOver => room.placement,
            _ => None,
        },
        kids_mode: room.kids_mode,
        streamer_mode: room.streamer_mode,
        duplicate_mode: room.duplicate_mode,
        pack: room.pack.clone(),
        deadline: room.timer.deadline().map(|d| d.to_rfc3339()),
        players: visible_players(room, room.players.iter(), viewer),
        hints: visible_hints(room),
        final_clues: room.final_clues.clone(),
        result: room.last_result.clone(),
        hints_submitted: room.hint_status().0,
        votes_cast: room.vote_status().0,
        you: viewer.to_string(),
        your_role: room.role_of(viewer),
        your_hint: room.hints.get(viewer).map(HintView::attributed),
    }
}

/// The target goes to cluers during the secret phases and to everyone once revealed
pub fn visible_target(room: &Room, viewer: &str) -> Option<u8> {
    match room.phase {
        phase if phase.is_secret_phase() => {
            let is_cluer = room.player(viewer).is_some()
                && !room.is_navigator(viewer)
                && !room.is_host(viewer);
            is_cluer.then_some(room.target)
        }
        RoomPhase::Reveal | RoomPhase::GameOver if room.last_result.is_some() => {
            Some(room.target)
        }
        _ => None,
    }
}

/// Copy players for `viewer`, masking other names in streamer mode.
/// The host display always sees real names.
pub fn visible_players<'a>(
    room: &Room,
    players: impl IntoIterator<Item = &'a Player>,
    viewer: &str,
) -> Vec<Player> {
    let mask = room.streamer_mode && !room.is_host(viewer);
    players
        .into_iter()
        .map(|p| {
            let mut player = p.clone();
            if mask && player.id != viewer {
                player.name = MASKED_NAME.to_string();
            }
            player
        })
        .collect()
}

fn visible_hints(room: &Room) -> Vec<HintView> {
    match room.phase {
        RoomPhase::Vote | RoomPhase::Place => {
            room.ballot().into_iter().map(HintView::anonymous).collect()
        }
        RoomPhase::Reveal | RoomPhase::GameOver => {
            let mut hints: Vec<HintView> = room
                .ballot()
                .into_iter()
                .map(HintView::attributed)
                .collect();
            hints.sort_by(|a, b| a.author_id.cmp(&b.author_id));
            hints
        }
        _ => Vec::new(),
    }
}
