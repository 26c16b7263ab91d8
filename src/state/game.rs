use super::room::Room;
use super::view::{build_view, RoomView};
use super::{canonical_code, AppState};
use crate::broadcast::Outbox;
use crate::error::RoomError;
use crate::protocol::ServerMessage;
use crate::types::*;
use rand::Rng;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Create a room hosted by `host_id`. Returns the code and the host's reconnect token.
    pub async fn create_room(&self, host_id: &ParticipantId) -> (RoomCode, ReconnectToken) {
        let mut outbox = Outbox::default();
        let created = {
            let mut rooms = self.rooms.write().await;
            // Collisions are rare with ~887M codes, but codes must be unique among live rooms
            let code = loop {
                let code = generate_room_code();
                if !rooms.contains_key(&code) {
                    break code;
                }
            };

            let room = Room::new(code.clone(), host_id.clone(), &self.config);
            let token = room.host_token.clone();
            outbox.snapshot(&room);
            rooms.insert(code.clone(), room);
            (code, token)
        };

        tracing::info!(room = %created.0, host = %host_id, "Room created");
        self.deliver(outbox).await;
        created
    }

    /// Snapshot of a room as `viewer` may see it
    pub async fn get_state(&self, viewer: &str, code: &str) -> Result<RoomView, RoomError> {
        let rooms = self.rooms.read().await;
        let room = rooms
            .get(&canonical_code(code))
            .ok_or(RoomError::RoomNotFound)?;
        Ok(build_view(room, viewer))
    }

    /// Host-only; takes effect from the next round
    pub async fn set_pack(
        &self,
        caller: &ParticipantId,
        code: &str,
        pack: &str,
    ) -> Result<(), RoomError> {
        self.with_room(code, |_, room, outbox| {
            room.ensure_host(caller, "change the spectrum pack")?;
            room.set_pack(pack)?;
            tracing::info!(room = %room.code, pack = %pack, "Spectrum pack changed");
            outbox.to_room(
                room,
                ServerMessage::PackUpdated {
                    pack: room.pack.clone(),
                },
            );
            outbox.snapshot(room);
            Ok(())
        })
        .await
    }

    /// Host-only. Returns the new setting; durations change from the next armed timer.
    pub async fn toggle_kids_mode(
        &self,
        caller: &ParticipantId,
        code: &str,
    ) -> Result<bool, RoomError> {
        self.with_room(code, |_, room, outbox| {
            room.ensure_host(caller, "toggle kids mode")?;
            let enabled = room.toggle_kids_mode();
            tracing::info!(room = %room.code, enabled, "Kids mode toggled");
            outbox.snapshot(room);
            Ok(enabled)
        })
        .await
    }

    pub async fn toggle_streamer_mode(
        &self,
        caller: &ParticipantId,
        code: &str,
    ) -> Result<bool, RoomError> {
        self.with_room(code, |_, room, outbox| {
            room.ensure_host(caller, "toggle streamer mode")?;
            let enabled = room.toggle_streamer_mode();
            tracing::info!(room = %room.code, enabled, "Streamer mode toggled");
            outbox.snapshot(room);
            Ok(enabled)
        })
        .await
    }
}
