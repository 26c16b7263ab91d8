//! Connection registry and outbound fan-out
//!
//! Room operations never send while holding the room lock. They queue
//! deliveries in an [`Outbox`], and the caller flushes it with
//! [`AppState::deliver`] once the lock is released.

use crate::protocol::ServerMessage;
use crate::state::room::Room;
use crate::state::view::build_view;
use crate::state::AppState;
use crate::types::ParticipantId;
use tokio::sync::mpsc::UnboundedSender;

/// Live outbound channel of one connection
pub type Outbound = UnboundedSender<ServerMessage>;

/// Messages queued for delivery, in order
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<(ParticipantId, ServerMessage)>,
}

impl Outbox {
    pub fn to(&mut self, recipient: &ParticipantId, msg: ServerMessage) {
        self.queued.push((recipient.clone(), msg));
    }

    /// Queue `msg` for every participant plus a non-playing host
    pub fn to_room(&mut self, room: &Room, msg: ServerMessage) {
        for recipient in room.recipients() {
            self.queued.push((recipient, msg.clone()));
        }
    }

    /// Queue a fresh snapshot for every recipient, each built for its reader
    pub fn snapshot(&mut self, room: &Room) {
        for recipient in room.recipients() {
            let state = build_view(room, &recipient);
            self.queued.push((recipient, ServerMessage::RoomState { state }));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }
}

impl AppState {
    /// Map a participant identity to its live channel, replacing any previous one
    pub async fn register_connection(&self, participant_id: &ParticipantId, tx: Outbound) {
        let mut connections = self.connections.write().await;
        if connections.insert(participant_id.clone(), tx).is_some() {
            tracing::debug!(participant = %participant_id, "Replaced live connection");
        }
    }

    /// Move a live channel from a temporary identity to a recovered one.
    /// Whatever channel the recovered identity had before is abandoned.
    pub async fn rebind_connection(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        tx: Outbound,
    ) {
        let mut connections = self.connections.write().await;
        if connections
            .get(from)
            .is_some_and(|stored| stored.same_channel(&tx))
        {
            connections.remove(from);
        }
        connections.insert(to.clone(), tx);
        tracing::debug!(from = %from, to = %to, "Rebound connection");
    }

    /// Drop the mapping for `participant_id` if `tx` is still its live channel.
    /// Returns false when the identity has already moved to another channel.
    pub async fn unregister_connection(&self, participant_id: &ParticipantId, tx: &Outbound) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(participant_id) {
            Some(stored) if stored.same_channel(tx) => {
                connections.remove(participant_id);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub async fn is_connected(&self, participant_id: &str) -> bool {
        self.connections.read().await.contains_key(participant_id)
    }

    /// Best-effort unicast. Messages to identities without a live channel are dropped.
    #[cfg(test)]
    pub async fn send_to(&self, recipient: &ParticipantId, msg: ServerMessage) {
        let connections = self.connections.read().await;
        if let Some(tx) = connections.get(recipient) {
            // The socket task may already be gone; reconnection covers missed messages
            let _ = tx.send(msg);
        }
    }

    /// Flush an outbox
    pub async fn deliver(&self, outbox: Outbox) {
        if outbox.is_empty() {
            return;
        }
        let connections = self.connections.read().await;
        for (recipient, msg) in outbox.queued {
            if let Some(tx) = connections.get(&recipient) {
                let _ = tx.send(msg);
            }
        }
    }
}
