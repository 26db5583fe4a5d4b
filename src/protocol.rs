use crate::types::*;
use serde::{Deserialize, Serialize};

/// Protocol version announced in the welcome message
pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving room-scoped events for a thread
    JoinThread { thread_id: ThreadId },
    /// Stop receiving room-scoped events for a thread
    LeaveThread { thread_id: ThreadId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        connection_id: ConnectionId,
        server_now: String,
    },
    /// Global: a thread was created
    ThreadCreated { thread: Thread },
    /// Global: votes, answered flag or replies of a thread changed
    ThreadUpdated { thread: Thread },
    /// Room-scoped: a reply was appended to a thread
    ReplyAdded { thread_id: ThreadId, reply: Reply },
    Joined { thread_id: ThreadId },
    Left { thread_id: ThreadId },
    Error { code: String, msg: String },
}

impl ServerMessage {
    /// Event name as seen by clients
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::ThreadCreated { .. } => "thread_created",
            ServerMessage::ThreadUpdated { .. } => "thread_updated",
            ServerMessage::ReplyAdded { .. } => "reply_added",
            ServerMessage::Joined { .. } => "joined",
            ServerMessage::Left { .. } => "left",
            ServerMessage::Error { .. } => "error",
        }
    }
}
