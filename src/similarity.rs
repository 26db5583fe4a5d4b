//! Keyword overlap matching and reply digests.
//!
//! Bag-of-words heuristics only. Everything here is pure and works on
//! snapshots handed in by the caller.

use crate::types::{Reply, Thread};
use std::collections::BTreeSet;

/// Words ignored by keyword extraction
pub const STOP_WORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "this", "that", "these", "those", "with",
];

/// Keywords must be longer than this many characters
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Most results [`find_similar`] returns
pub const MAX_SIMILAR: usize = 3;

/// How many replies go into a summary
pub const SUMMARY_REPLIES: usize = 3;

/// Reply content is cut to this many characters in a summary
pub const SUMMARY_REPLY_CHARS: usize = 100;

pub const SUMMARY_LABEL: &str = "Discussion summary:";
pub const NO_REPLIES_SUMMARY: &str = "No replies yet.";
const ELLIPSIS: &str = "...";

/// Lowercased, alphanumeric-only, deduplicated tokens longer than three
/// characters, minus stop words.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Threads sharing at least half of the query's keywords (and at least one).
///
/// Results keep the candidates' order and are not ranked by overlap.
pub fn find_similar<'a, I>(query: &str, candidates: I) -> Vec<Thread>
where
    I: IntoIterator<Item = &'a Thread>,
{
    let keywords = extract_keywords(query);
    let threshold = keywords.len() / 2;

    candidates
        .into_iter()
        .filter(|thread| {
            let overlap = extract_keywords(&thread.searchable_text())
                .intersection(&keywords)
                .count();
            overlap > 0 && overlap >= threshold
        })
        .take(MAX_SIMILAR)
        .cloned()
        .collect()
}

/// First few replies, each cut to a fixed length, joined after a label
pub fn summarize(replies: &[Reply]) -> String {
    if replies.is_empty() {
        return NO_REPLIES_SUMMARY.to_string();
    }

    let points: Vec<String> = replies
        .iter()
        .take(SUMMARY_REPLIES)
        .map(|reply| truncate(&reply.content, SUMMARY_REPLY_CHARS))
        .collect();

    format!("{} {}", SUMMARY_LABEL, points.join(" "))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn thread(id: &str, title: &str, body: &str) -> Thread {
        Thread {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            author: "Rohan".to_string(),
            votes: 0,
            is_answered: false,
            timestamp: Utc::now(),
            replies: Vec::new(),
        }
    }

    fn reply(content: &str) -> Reply {
        Reply {
            id: ulid::Ulid::new().to_string(),
            content: content.to_string(),
            author: "Alex".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn words(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_extract_keywords() {
        assert_eq!(
            extract_keywords("How do I deploy Node.js on Cloud Run?"),
            words(&["cloud", "deploy", "nodejs"])
        );
    }

    #[test]
    fn test_extract_keywords_case_insensitive() {
        assert_eq!(extract_keywords("Cloud Run"), extract_keywords("cloud run"));
        assert_eq!(extract_keywords("Cloud Run"), words(&["cloud"]));
    }

    #[test]
    fn test_extract_keywords_drops_stop_words_and_duplicates() {
        assert_eq!(
            extract_keywords("Which THESE those with rust Rust rust!"),
            words(&["rust"])
        );
    }

    #[test]
    fn test_extract_keywords_idempotent() {
        let once = extract_keywords("Best practices for React component structure?");
        let joined = once.iter().cloned().collect::<Vec<_>>().join(" ");
        assert_eq!(extract_keywords(&joined), once);
    }

    #[test]
    fn test_extract_keywords_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("?! a an the").is_empty());
    }

    #[test]
    fn test_find_similar_self_match() {
        let corpus = vec![
            thread("1", "Tailwind CSS vs traditional CSS?", "Which one scales better"),
            thread(
                "2",
                "How do I deploy Node.js on Cloud Run?",
                "Build fails during npm install on Cloud Run",
            ),
        ];

        let found = find_similar("How do I deploy Node.js on Cloud Run?", &corpus);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn test_find_similar_caps_at_three_in_corpus_order() {
        let corpus: Vec<Thread> = (0..5)
            .map(|i| thread(&i.to_string(), "rust async runtime", "tokio"))
            .collect();

        let found = find_similar("async rust", &corpus);
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_find_similar_requires_half_overlap() {
        let corpus = vec![
            thread("1", "rust", "nothing else"),
            thread("2", "rust tokio", "axum"),
        ];

        // five keywords, threshold is two
        let found = find_similar("rust tokio axum serde tracing", &corpus);
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_find_similar_never_returns_zero_overlap() {
        let corpus = vec![thread("1", "react", "hooks")];

        // single keyword, threshold floors to zero
        assert!(find_similar("python", &corpus).is_empty());
        assert!(find_similar("", &corpus).is_empty());
        assert!(find_similar("rust", &Vec::<Thread>::new()).is_empty());
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), "No replies yet.");
    }

    #[test]
    fn test_summarize_short_replies() {
        let replies = vec![reply("Use gcloud."), reply("Enable Cloud Build.")];
        assert_eq!(
            summarize(&replies),
            "Discussion summary: Use gcloud. Enable Cloud Build."
        );
    }

    #[test]
    fn test_summarize_takes_first_three() {
        let replies = vec![reply("a"), reply("b"), reply("c"), reply("d")];
        assert_eq!(summarize(&replies), "Discussion summary: a b c");
    }

    #[test]
    fn test_summarize_truncates_long_replies() {
        let long = "x".repeat(150);
        let exact = "y".repeat(100);
        let summary = summarize(&[reply(&long), reply(&exact)]);

        assert_eq!(
            summary,
            format!("Discussion summary: {}... {}", "x".repeat(100), exact)
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "é".repeat(101);
        assert_eq!(truncate(&text, 100), format!("{}...", "é".repeat(100)));
    }
}
