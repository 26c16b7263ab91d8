pub mod handlers;
mod host;
mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::broadcast::Outbound;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::ParticipantId;

/// One live connection and the identity it currently speaks for
#[derive(Debug)]
pub struct Session {
    pub participant_id: ParticipantId,
    pub tx: Outbound,
}

impl Session {
    /// Register a fresh identity. The receiver yields `connected` first.
    pub async fn open(state: &AppState) -> (Self, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let participant_id = ulid::Ulid::new().to_string();
        state.register_connection(&participant_id, tx.clone()).await;
        let _ = tx.send(ServerMessage::Connected {
            participant_id: participant_id.clone(),
        });
        (Self { participant_id, tx }, rx)
    }

    /// Handle one client frame. The reply is queued on this connection's channel,
    /// behind anything the command itself fanned out.
    pub async fn handle_text(&mut self, text: &str, state: &AppState) {
        let reply = match serde_json::from_str::<ClientMessage>(text) {
            Ok(client_msg) => handlers::handle_message(client_msg, self, state).await,
            Err(e) => {
                tracing::warn!("Failed to parse client message: {}", e);
                Some(ServerMessage::error(
                    "PARSE_ERROR",
                    format!("Invalid message format: {}", e),
                ))
            }
        };

        if let Some(response) = reply {
            if self.tx.send(response).is_err() {
                tracing::error!("Failed to queue response");
            }
        }
    }

    pub async fn close(&self, state: &AppState) {
        state.disconnect(&self.participant_id, &self.tx).await;
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (mut session, mut outbound) = Session::open(&state).await;

    tracing::info!(participant = %session.participant_id, "WebSocket connected");

    loop {
        tokio::select! {
            // Targeted and room-wide messages queued for this connection
            Some(msg) = outbound.recv() => {
                if let Ok(json) = serde_json::to_string(&msg) {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);
                        session.handle_text(text.as_str(), &state).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    session.close(&state).await;
    tracing::info!(participant = %session.participant_id, "WebSocket connection closed");
}
