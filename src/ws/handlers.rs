//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Connection-level messages are handled here; room commands are dispatched to
//! the host and player handler modules. Role checks happen inside the room,
//! since whether a connection is host or navigator depends on the room.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

use super::{host, player, Session};

/// Handle a client message and return an optional direct reply
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &AppState,
) -> Option<ServerMessage> {
    let caller = session.participant_id.clone();

    match msg {
        // Connection messages
        ClientMessage::CreateRoom => {
            let (code, reconnect_token) = state.create_room(&caller).await;
            Some(ServerMessage::RoomCreated {
                code,
                reconnect_token,
            })
        }

        ClientMessage::Reconnect { token } => {
            match state
                .reconnect(&session.participant_id, session.tx.clone(), &token)
                .await
            {
                Ok((code, participant_id)) => {
                    session.participant_id = participant_id.clone();
                    Some(ServerMessage::ReconnectConfirmed {
                        code,
                        participant_id,
                    })
                }
                Err(e) => {
                    tracing::info!("Reconnect with unknown token from {}", caller);
                    Some(e.into())
                }
            }
        }

        ClientMessage::GetState { code } => match state.get_state(&caller, &code).await {
            Ok(view) => Some(ServerMessage::RoomState { state: view }),
            Err(e) => Some(e.into()),
        },

        // Player messages
        ClientMessage::JoinRoom { code, name, avatar } => {
            player::handle_join(state, &caller, code, name, avatar).await
        }

        ClientMessage::SubmitHint { code, text } => {
            player::handle_submit_hint(state, &caller, code, text).await
        }

        ClientMessage::SubmitVote { code, hint_ids } => {
            player::handle_submit_vote(state, &caller, code, hint_ids).await
        }

        ClientMessage::SetPlacement { code, value } => {
            player::handle_set_placement(state, &caller, code, value).await
        }

        ClientMessage::LockPlacement { code } => {
            player::handle_lock_placement(state, &caller, code).await
        }

        // Host commands (host identity checked by the room)
        ClientMessage::StartRound { code } => host::handle_start_round(state, &caller, code).await,

        ClientMessage::CompleteHintPhase { code } => {
            host::handle_complete_hint_phase(state, &caller, code).await
        }

        ClientMessage::CompleteVotePhase { code } => {
            host::handle_complete_vote_phase(state, &caller, code).await
        }

        ClientMessage::ToggleKidsMode { code } => {
            host::handle_toggle_kids_mode(state, &caller, code).await
        }

        ClientMessage::ToggleStreamerMode { code } => {
            host::handle_toggle_streamer_mode(state, &caller, code).await
        }

        ClientMessage::SetPack { code, pack } => {
            host::handle_set_pack(state, &caller, code, pack).await
        }

        ClientMessage::AddTime { code } => host::handle_add_time(state, &caller, code).await,

        ClientMessage::KickPlayer { code, player_id } => {
            host::handle_kick_player(state, &caller, code, player_id).await
        }

        ClientMessage::MutePlayer { code, player_id } => {
            host::handle_mute_player(state, &caller, code, player_id).await
        }
    }
}
