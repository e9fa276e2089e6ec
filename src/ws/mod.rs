use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use crate::state::AppState;

/// Registry of live gateway connections, surfaced by the health endpoint
pub struct GatewayConnections {
    connections: dashmap::DashMap<String, i64>, // conn_id -> connected_at
}

impl GatewayConnections {
    pub fn new() -> Self {
        Self {
            connections: dashmap::DashMap::new(),
        }
    }

    pub fn add(&self, conn_id: &str) {
        self.connections
            .insert(conn_id.to_string(), Utc::now().timestamp());
    }

    pub fn remove(&self, conn_id: &str) {
        self.connections.remove(conn_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for GatewayConnections {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket routes
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// WebSocket upgrade handler
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Echo gateway: text and binary frames are reflected back unchanged.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();
    state.gateway.add(&conn_id);

    tracing::info!(conn_id = %conn_id, "Gateway connection opened");

    let (mut sender, mut receiver) = socket.split();

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                tracing::debug!(conn_id = %conn_id, len = text.len(), "Echoing text frame");
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(data)) => {
                tracing::debug!(conn_id = %conn_id, len = data.len(), "Echoing binary frame");
                if sender.send(Message::Binary(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping/pong handled by axum
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, error = %e, "Gateway read error");
                break;
            }
        }
    }

    state.gateway.remove(&conn_id);
    tracing::info!(conn_id = %conn_id, "Gateway connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_registry_counts() {
        let registry = GatewayConnections::new();
        assert_eq!(registry.connection_count(), 0);

        registry.add("conn-1");
        registry.add("conn-2");
        assert_eq!(registry.connection_count(), 2);

        registry.remove("conn-1");
        assert_eq!(registry.connection_count(), 1);

        // Removing an unknown id is a no-op.
        registry.remove("conn-9");
        assert_eq!(registry.connection_count(), 1);
    }
}
