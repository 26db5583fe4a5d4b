//! Thread mutations.
//!
//! Each one commits to the store first and publishes only on success, so
//! clients are never told about state they can't fetch.

use super::AppState;
use crate::error::AppResult;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    pub async fn list_threads(&self, query: &ThreadQuery) -> Vec<Thread> {
        self.store.list_threads(query).await
    }

    pub async fn get_thread(&self, id: &str) -> AppResult<Thread> {
        self.store.get_thread(id).await
    }

    /// Create a thread and announce it to everyone
    pub async fn create_thread(&self, new: NewThread) -> AppResult<Thread> {
        let thread = self.store.create_thread(new).await?;
        tracing::info!(thread_id = %thread.id, author = %thread.author, "Thread created");

        self.hub
            .publish_global(ServerMessage::ThreadCreated {
                thread: thread.clone(),
            })
            .await;
        Ok(thread)
    }

    /// Append a reply. Viewers of the thread get the reply itself,
    /// everyone gets the updated thread.
    pub async fn add_reply(&self, thread_id: &str, new: NewReply) -> AppResult<Reply> {
        let (reply, thread) = self.store.append_reply(thread_id, new).await?;
        tracing::info!(thread_id, reply_id = %reply.id, "Reply added");

        self.hub
            .publish_to_room(
                thread_id,
                ServerMessage::ReplyAdded {
                    thread_id: thread_id.to_string(),
                    reply: reply.clone(),
                },
            )
            .await;

        self.hub
            .publish_global(ServerMessage::ThreadUpdated { thread })
            .await;

        Ok(reply)
    }

    pub async fn upvote_thread(&self, thread_id: &str) -> AppResult<Thread> {
        let thread = self.store.increment_vote(thread_id).await?;
        tracing::info!(thread_id, votes = thread.votes, "Thread upvoted");
        self.publish_thread_updated(&thread).await;
        Ok(thread)
    }

    pub async fn mark_answered(&self, thread_id: &str) -> AppResult<Thread> {
        let thread = self.store.set_answered(thread_id).await?;
        tracing::info!(thread_id, "Thread marked as answered");
        self.publish_thread_updated(&thread).await;
        Ok(thread)
    }

    /// Vote and answered changes go to everyone, not just the thread's room
    async fn publish_thread_updated(&self, thread: &Thread) {
        self.hub
            .publish_global(ServerMessage::ThreadUpdated {
                thread: thread.clone(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn new_thread(title: &str) -> NewThread {
        NewThread {
            title: title.to_string(),
            body: "Body text".to_string(),
            author: Some("Rohan".to_string()),
        }
    }

    fn new_reply(content: &str) -> NewReply {
        NewReply {
            content: content.to_string(),
            author: None,
        }
    }

    #[tokio::test]
    async fn test_create_thread_publishes_globally() {
        let state = AppState::new();
        let mut viewer = state.hub.connect().await;

        let thread = state.create_thread(new_thread("Hello")).await.unwrap();

        match viewer.events.try_recv() {
            Ok(ServerMessage::ThreadCreated { thread: published }) => {
                assert_eq!(published, thread)
            }
            other => panic!("Expected ThreadCreated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_create_publishes_nothing() {
        let state = AppState::new();
        let mut viewer = state.hub.connect().await;

        let result = state.create_thread(new_thread("  ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(viewer.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_add_reply_publishes_room_then_global() {
        let state = AppState::new();
        let thread = state.create_thread(new_thread("Hello")).await.unwrap();

        let mut member = state.hub.connect().await;
        let mut outsider = state.hub.connect().await;
        state.hub.join(&member.id, &thread.id).await;

        let reply = state
            .add_reply(&thread.id, new_reply("First!"))
            .await
            .unwrap();

        match member.events.try_recv() {
            Ok(ServerMessage::ReplyAdded {
                thread_id,
                reply: published,
            }) => {
                assert_eq!(thread_id, thread.id);
                assert_eq!(published, reply);
            }
            other => panic!("Expected ReplyAdded, got {:?}", other),
        }
        match member.events.try_recv() {
            Ok(ServerMessage::ThreadUpdated { thread: updated }) => {
                assert_eq!(updated.replies.len(), 1)
            }
            other => panic!("Expected ThreadUpdated, got {:?}", other),
        }

        assert!(matches!(
            outsider.events.try_recv(),
            Ok(ServerMessage::ThreadUpdated { .. })
        ));
        assert!(outsider.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reply_to_missing_thread_publishes_nothing() {
        let state = AppState::new();
        let mut viewer = state.hub.connect().await;
        state.hub.join(&viewer.id, "missing").await;

        let result = state.add_reply("missing", new_reply("hi")).await;
        assert_eq!(result, Err(AppError::NotFound("Thread")));
        assert!(viewer.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_upvote_reaches_connections_without_rooms() {
        let state = AppState::new();
        let thread = state.create_thread(new_thread("Vote me")).await.unwrap();

        let mut a = state.hub.connect().await;
        let mut b = state.hub.connect().await;
        state.hub.join(&a.id, &thread.id).await;

        let voted = state.upvote_thread(&thread.id).await.unwrap();
        assert_eq!(voted.votes, 1);

        for sub in [&mut a, &mut b] {
            match sub.events.try_recv() {
                Ok(ServerMessage::ThreadUpdated { thread }) => assert_eq!(thread.votes, 1),
                other => panic!("Expected ThreadUpdated, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_mark_answered_publishes_update() {
        let state = AppState::new();
        let thread = state.create_thread(new_thread("Solved?")).await.unwrap();
        let mut viewer = state.hub.connect().await;

        let answered = state.mark_answered(&thread.id).await.unwrap();
        assert!(answered.is_answered);
        assert!(matches!(
            viewer.events.try_recv(),
            Ok(ServerMessage::ThreadUpdated { thread }) if thread.is_answered
        ));

        assert!(state.mark_answered("missing").await.is_err());
        assert!(viewer.events.try_recv().is_err());
    }
}
