//! Host command handlers
//!
//! The room rejects these with `NOT_HOST` unless the caller created it.
//! Successful commands reply with nothing: the room broadcast already
//! carries the new state to every recipient, the host included.

use crate::error::RoomError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{ParticipantId, RoomCode};

fn ack(result: Result<(), RoomError>) -> Option<ServerMessage> {
    result.err().map(|err| {
        tracing::debug!(code = err.code(), kind = ?err.kind(), "Host command rejected: {}", err);
        ServerMessage::from(err)
    })
}

pub async fn handle_start_round(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    tracing::info!("Start round requested for {}", code);
    ack(state.start_round(caller, &code).await)
}

pub async fn handle_complete_hint_phase(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    ack(state.complete_hint_phase(caller, &code).await)
}

pub async fn handle_complete_vote_phase(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    ack(state.complete_vote_phase(caller, &code).await)
}

pub async fn handle_toggle_kids_mode(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    ack(state.toggle_kids_mode(caller, &code).await.map(|_| ()))
}

pub async fn handle_toggle_streamer_mode(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    ack(state.toggle_streamer_mode(caller, &code).await.map(|_| ()))
}

pub async fn handle_set_pack(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    pack: String,
) -> Option<ServerMessage> {
    ack(state.set_pack(caller, &code, &pack).await)
}

pub async fn handle_add_time(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
) -> Option<ServerMessage> {
    ack(state.add_time(caller, &code).await.map(|_| ()))
}

pub async fn handle_kick_player(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    player_id: ParticipantId,
) -> Option<ServerMessage> {
    tracing::info!("Kick of {} requested in {}", player_id, code);
    ack(state.kick_player(caller, &code, &player_id).await)
}

pub async fn handle_mute_player(
    state: &AppState,
    caller: &ParticipantId,
    code: RoomCode,
    player_id: ParticipantId,
) -> Option<ServerMessage> {
    ack(state.toggle_mute_player(caller, &code, &player_id).await.map(|_| ()))
}
