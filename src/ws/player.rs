//! Player command handlers

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{HintId, ParticipantId, RoomCode};

pub async fn handle_join(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    name: String,
    avatar: String,
) -> Option<ServerMessage> {
    match state.join_room(caller, &code, &name, &avatar).await {
        Ok((code, reconnect_token)) => Some(ServerMessage::JoinConfirmed {
            code,
            participant_id: caller.clone(),
            reconnect_token,
        }),
        Err(e) => {
            tracing::info!("Join of {} failed: {}", code, e);
            Some(e.into())
        }
    }
}

pub async fn handle_submit_hint(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    text: String,
) -> Option<ServerMessage> {
    match state.submit_hint(caller, &code, &text).await {
        Ok(hint) => Some(ServerMessage::HintAccepted {
            hint_id: hint.id,
            resubmitted: hint.resubmitted,
        }),
        Err(e) => {
            tracing::warn!("Hint from {} rejected: {}", caller, e);
            Some(ServerMessage::hint_rejected(&e))
        }
    }
}

pub async fn handle_submit_vote(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    hint_ids: Vec<HintId>,
) -> Option<ServerMessage> {
    match state.submit_vote(caller, &code, hint_ids.clone()).await {
        Ok(()) => Some(ServerMessage::VoteAccepted { hint_ids }),
        Err(e) => {
            tracing::info!("Vote from {} rejected: {}", caller, e);
            Some(ServerMessage::vote_rejected(&e))
        }
    }
}

pub async fn handle_set_placement(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    value: f64,
) -> Option<ServerMessage> {
    match state.set_placement(caller, &code, value).await {
        Ok(value) => Some(ServerMessage::PlacementAccepted { value }),
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_lock_placement(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    state
        .lock_placement(caller, &code)
        .await
        .err()
        .map(ServerMessage::from)
}
