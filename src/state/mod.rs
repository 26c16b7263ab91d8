mod engine;
mod game;
mod player;
pub mod room;
pub mod score;
pub mod view;

use crate::broadcast::{Outbound, Outbox};
use crate::config::GameConfig;
use crate::content::{ContentFilter, RustrictFilter};
use crate::error::RoomError;
use crate::types::*;
use room::Room;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
///
/// All room mutations go through the single `rooms` lock, so every command and
/// every timer callback runs to completion before the next one touches a room.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomCode, Room>>>,
    /// Live outbound channel per participant identity
    pub connections: Arc<RwLock<HashMap<ParticipantId, Outbound>>>,
    pub config: Arc<GameConfig>,
    pub filter: Arc<dyn ContentFilter>,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        Self::with_filter(config, Arc::new(RustrictFilter))
    }

    pub fn with_filter(config: GameConfig, filter: Arc<dyn ContentFilter>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            filter,
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn phase_of(&self, code: &str) -> Option<RoomPhase> {
        self.rooms
            .read()
            .await
            .get(&canonical_code(code))
            .map(|room| room.phase)
    }

    /// Run `op` against one room under the registry lock, then deliver what it queued.
    /// A failed op queues nothing, so nothing is delivered.
    pub(crate) async fn with_room<T, F>(&self, code: &str, op: F) -> Result<T, RoomError>
    where
        F: FnOnce(&AppState, &mut Room, &mut Outbox) -> Result<T, RoomError>,
    {
        let mut outbox = Outbox::default();
        let result = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(&canonical_code(code))
                .ok_or(RoomError::RoomNotFound)?;
            op(self, room, &mut outbox)
        };
        self.deliver(outbox).await;
        result
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

/// Room codes are matched case-insensitively
pub fn canonical_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}
