pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(kind = msg.kind(), "Failed to encode server message: {}", e);
            None
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut subscription = state.hub.connect().await;
    let connection_id = subscription.id;
    tracing::info!(connection = %connection_id, "WebSocket connected");

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        connection_id,
        server_now: chrono::Utc::now().to_rfc3339(),
    };

    let welcomed = match encode(&welcome) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };

    if welcomed {
        loop {
            tokio::select! {
                // Hub events, in publish order
                event = subscription.events.recv() => {
                    let Some(event) = event else { break };
                    if let Some(msg) = encode(&event) {
                        if sender.send(msg).await.is_err() {
                            tracing::debug!(connection = %connection_id, "Send failed, closing");
                            break;
                        }
                    }
                }

                // Handle client messages
                ws_msg = receiver.next() => {
                    match ws_msg {
                        Some(Ok(Message::Text(text))) => {
                            tracing::debug!(connection = %connection_id, "Received message: {}", text.as_str());

                            let response = match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(client_msg) => {
                                    handlers::handle_message(client_msg, &connection_id, &state).await
                                }
                                Err(e) => {
                                    tracing::warn!(connection = %connection_id, "Failed to parse client message: {}", e);
                                    Some(ServerMessage::Error {
                                        code: "PARSE_ERROR".to_string(),
                                        msg: format!("Invalid message format: {}", e),
                                    })
                                }
                            };

                            if let Some(msg) = response.as_ref().and_then(encode) {
                                if sender.send(msg).await.is_err() {
                                    tracing::debug!(connection = %connection_id, "Failed to send response");
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!(connection = %connection_id, "WebSocket closed");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if sender.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(connection = %connection_id, "WebSocket error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
    } else {
        tracing::warn!(connection = %connection_id, "Failed to send welcome message");
    }

    state.hub.disconnect(&connection_id).await;
    tracing::info!(connection = %connection_id, "WebSocket connection closed");
}
