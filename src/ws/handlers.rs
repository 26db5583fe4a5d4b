//! WebSocket message dispatch
//!
//! Clients only manage their room memberships over the socket. Thread
//! mutations arrive over HTTP and reach sockets through the hub.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::ConnectionId;
use std::sync::Arc;

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    connection_id: &ConnectionId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // No existence check: a room for an unknown thread simply never hears anything
        ClientMessage::JoinThread { thread_id } => {
            tracing::info!(connection = %connection_id, thread_id, "Join thread");
            state.hub.join(connection_id, &thread_id).await;
            Some(ServerMessage::Joined { thread_id })
        }

        ClientMessage::LeaveThread { thread_id } => {
            tracing::info!(connection = %connection_id, thread_id, "Leave thread");
            state.hub.leave(connection_id, &thread_id).await;
            Some(ServerMessage::Left { thread_id })
        }
    }
}
