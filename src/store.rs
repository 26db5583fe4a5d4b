//! Durable thread storage as seen by the rest of the crate.
//!
//! `MemoryStore` keeps everything in process; swapping in a database only
//! requires another `ThreadStore` impl.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::types::*;

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn list_threads(&self, query: &ThreadQuery) -> Vec<Thread>;

    async fn get_thread(&self, id: &str) -> AppResult<Thread>;

    async fn create_thread(&self, new: NewThread) -> AppResult<Thread>;

    /// Returns the reply and the thread as this append left it
    async fn append_reply(&self, thread_id: &str, new: NewReply) -> AppResult<(Reply, Thread)>;

    async fn increment_vote(&self, thread_id: &str) -> AppResult<Thread>;

    async fn set_answered(&self, thread_id: &str) -> AppResult<Thread>;

    async fn count(&self) -> usize;

    /// Insert a fully formed thread as-is (seeding, imports)
    async fn insert_thread(&self, thread: Thread);
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    threads: Arc<RwLock<HashMap<ThreadId, Thread>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to a stored thread and return the updated copy
    async fn update<F>(&self, thread_id: &str, f: F) -> AppResult<Thread>
    where
        F: FnOnce(&mut Thread) + Send,
    {
        let mut threads = self.threads.write().await;
        let thread = threads
            .get_mut(thread_id)
            .ok_or(AppError::NotFound("Thread"))?;
        f(thread);
        Ok(thread.clone())
    }
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Votes descending then newest first, or newest first only
pub fn sort_threads(threads: &mut [Thread], sort: SortKey) {
    match sort {
        SortKey::Votes => threads.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        }),
        SortKey::Date => threads.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn list_threads(&self, query: &ThreadQuery) -> Vec<Thread> {
        let mut threads: Vec<Thread> = self
            .threads
            .read()
            .await
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        sort_threads(&mut threads, query.sort);
        threads
    }

    async fn get_thread(&self, id: &str) -> AppResult<Thread> {
        self.threads
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound("Thread"))
    }

    async fn create_thread(&self, new: NewThread) -> AppResult<Thread> {
        let title = required(&new.title, "Title")?;
        let body = required(&new.body, "Body")?;
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let thread = Thread {
            id: ulid::Ulid::new().to_string(),
            title,
            body,
            author: author_label(new.author.as_deref()),
            votes: 0,
            is_answered: false,
            timestamp: Utc::now(),
            replies: Vec::new(),
        };

        self.threads
            .write()
            .await
            .insert(thread.id.clone(), thread.clone());
        Ok(thread)
    }

    async fn append_reply(&self, thread_id: &str, new: NewReply) -> AppResult<(Reply, Thread)> {
        let content = required(&new.content, "Reply content")?;
        let reply = Reply {
            id: ulid::Ulid::new().to_string(),
            content,
            author: author_label(new.author.as_deref()),
            timestamp: Utc::now(),
        };

        let appended = reply.clone();
        let thread = self
            .update(thread_id, move |thread| thread.replies.push(appended))
            .await?;
        Ok((reply, thread))
    }

    async fn increment_vote(&self, thread_id: &str) -> AppResult<Thread> {
        self.update(thread_id, |thread| thread.votes += 1).await
    }

    async fn set_answered(&self, thread_id: &str) -> AppResult<Thread> {
        self.update(thread_id, |thread| thread.is_answered = true)
            .await
    }

    async fn count(&self) -> usize {
        self.threads.read().await.len()
    }

    async fn insert_thread(&self, thread: Thread) {
        self.threads.write().await.insert(thread.id.clone(), thread);
    }
}
