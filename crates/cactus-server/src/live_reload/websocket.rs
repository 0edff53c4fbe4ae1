//! WebSocket handler for live reload.
//!
//! Registers each connection and forwards reload messages to the client.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use super::registry::{Connection, ConnectionId, ConnectionRegistry};
use crate::state::AppState;

/// Messages a connection may have queued before broadcasts to it fail.
const QUEUE_CAPACITY: usize = 16;

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Removes the connection from the registry when dropped.
///
/// Covers every way the socket task can end, including cancellation when
/// the runtime shuts down.
struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove(self.id) {
            tracing::debug!(connection = %self.id, "Live reload connection closed");
        }
    }
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut shutdown = state.shutdown.clone();
    if *shutdown.borrow_and_update() {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
    let id = state.registry.next_id();
    state.registry.add(Connection::new(id, tx));
    let _registration = Registration {
        registry: Arc::clone(&state.registry),
        id,
    };
    tracing::debug!(connection = %id, "Live reload connection opened");

    loop {
        tokio::select! {
            // Forward reload messages to client
            Some(message) = rx.recv() => {
                if socket.send(Message::Text(message.as_str().into())).await.is_err() {
                    break;
                }
            }
            // Client messages carry no meaning; only watch for the close
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = shutdown.changed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
