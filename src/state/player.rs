use super::AppState;
use crate::broadcast::{Outbound, Outbox};
use crate::error::RoomError;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Join `participant_id` to a room. Returns the reconnect token for this membership.
    pub async fn join_room(
        &self,
        participant_id: &ParticipantId,
        code: &str,
        name: &str,
        avatar: &str,
    ) -> Result<(RoomCode, ReconnectToken), RoomError> {
        self.with_room(code, |state, room, outbox| {
            let token = room.add_player(participant_id, name, avatar, state.filter.as_ref())?;
            tracing::info!(
                room = %room.code,
                player = %participant_id,
                players = room.players.len(),
                "Player joined"
            );
            outbox.snapshot(room);
            Ok((room.code.clone(), token))
        })
        .await
    }

    /// Resolve a reconnect token in any live room and rebind the caller's channel to
    /// the recovered identity. The caller's temporary identity is dropped.
    pub async fn reconnect(
        &self,
        session_id: &ParticipantId,
        tx: Outbound,
        token: &str,
    ) -> Result<(RoomCode, ParticipantId), RoomError> {
        let mut outbox = Outbox::default();
        let (code, participant_id) = {
            let mut rooms = self.rooms.write().await;
            let (room, participant_id) = rooms
                .values_mut()
                .find_map(|room| {
                    let id = room.reconnect(token)?;
                    Some((room, id))
                })
                .ok_or(RoomError::UnknownToken)?;

            outbox.snapshot(room);
            (room.code.clone(), participant_id)
        };

        tracing::info!(room = %code, player = %participant_id, "Participant reconnected");
        self.rebind_connection(session_id, &participant_id, tx).await;
        self.deliver(outbox).await;
        Ok((code, participant_id))
    }

    /// Socket closed. Ignored if the identity already moved to a newer channel.
    pub async fn disconnect(&self, participant_id: &ParticipantId, tx: &Outbound) {
        if !self.unregister_connection(participant_id, tx).await {
            tracing::debug!(player = %participant_id, "Stale channel closed");
            return;
        }

        let mut outbox = Outbox::default();
        {
            let mut rooms = self.rooms.write().await;
            for room in rooms.values_mut() {
                if room.set_connected(participant_id, false) {
                    tracing::info!(room = %room.code, player = %participant_id, "Player disconnected");
                    outbox.snapshot(room);
                }
            }
        }
        self.deliver(outbox).await;
    }

    /// Host-only, between rounds. The kicked player's token stops working.
    pub async fn kick_player(
        &self,
        caller: &ParticipantId,
        code: &str,
        player_id: &ParticipantId,
    ) -> Result<(), RoomError> {
        self.with_room(code, |_, room, outbox| {
            room.ensure_host(caller, "kick players")?;
            let kicked = room.remove_player(player_id)?;
            tracing::info!(room = %room.code, player = %kicked.id, "Player kicked");
            outbox.to(
                &kicked.id,
                ServerMessage::Kicked {
                    code: room.code.clone(),
                },
            );
            outbox.snapshot(room);
            Ok(())
        })
        .await
    }

    /// Host-only, any phase. Returns whether the player is now muted.
    pub async fn toggle_mute_player(
        &self,
        caller: &ParticipantId,
        code: &str,
        player_id: &ParticipantId,
    ) -> Result<bool, RoomError> {
        self.with_room(code, |_, room, outbox| {
            room.ensure_host(caller, "mute players")?;
            let muted = room.toggle_mute(player_id)?;
            tracing::info!(room = %room.code, player = %player_id, muted, "Player mute toggled");
            outbox.snapshot(room);
            Ok(muted)
        })
        .await
    }
}
