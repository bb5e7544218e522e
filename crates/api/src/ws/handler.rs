use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use gala_core::types::DbId;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Query parameters for the WebSocket endpoint.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// JWT access token; browsers cannot set headers on WS upgrades.
    pub token: String,
}

/// Client-to-server control frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientFrame {
    #[serde(rename = "watch")]
    Watch { job_id: DbId },
    #[serde(rename = "unwatch")]
    Unwatch { job_id: DbId },
}

/// GET /api/v1/ws?token=...
///
/// Authenticates the token, then upgrades the connection. The connection
/// is registered with `WsManager` and managed by two tasks (sender +
/// receiver).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let claims = match validate_token(&params.token, &state.config.jwt) {
        Ok(claims) => claims,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, claims.sub))
        .into_response()
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound watch/unwatch frames on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(text.as_str()) {
                Ok(ClientFrame::Watch { job_id }) => {
                    tracing::debug!(conn_id = %conn_id, job_id, "Watching job");
                    ws_manager.watch_job(&conn_id, job_id).await;
                }
                Ok(ClientFrame::Unwatch { job_id }) => {
                    ws_manager.unwatch_job(&conn_id, job_id).await;
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring unknown frame");
                }
            },
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
