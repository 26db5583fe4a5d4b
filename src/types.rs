use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ThreadId = String;
pub type ReplyId = String;
pub type ConnectionId = ulid::Ulid;

/// Author label used when a client doesn't provide one
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Maximum title length in characters
pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    pub id: ReplyId,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: ThreadId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub votes: u64,
    #[serde(default)]
    pub is_answered: bool,
    pub timestamp: DateTime<Utc>,
    /// Insertion order, never reordered
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Thread {
    /// Text the similarity engine looks at for this thread
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Votes descending, then newest first
    #[default]
    Votes,
    /// Newest first
    Date,
}

/// Filter and ordering for thread listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "sort_by")]
    pub sort: SortKey,
}

impl ThreadQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            sort: SortKey::default(),
        }
    }

    /// Case-insensitive substring match against title, body or author.
    /// An empty or missing search term matches everything.
    pub fn matches(&self, thread: &Thread) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };

        thread.title.to_lowercase().contains(&needle)
            || thread.body.to_lowercase().contains(&needle)
            || thread.author.to_lowercase().contains(&needle)
    }
}

/// Payload for creating a thread. Missing fields fail validation, not parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewThread {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// Payload for replying to a thread
#[derive(Debug, Clone, Deserialize)]
pub struct NewReply {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// Trim an author label, falling back to `Anonymous`
pub fn author_label(author: Option<&str>) -> String {
    author
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(ANONYMOUS_AUTHOR)
        .to_string()
}
