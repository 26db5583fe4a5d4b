//! Startup data for an empty board.
//!
//! Seeding writes straight to the store; nothing is published to the hub.

use chrono::{TimeZone, Utc};
use std::path::Path;
use thiserror::Error;

use crate::config::Config;
use crate::store::ThreadStore;
use crate::types::{Reply, Thread};

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Seed the store according to config. Returns how many threads were inserted.
pub async fn seed(store: &dyn ThreadStore, config: &Config) -> Result<usize, SeedError> {
    if store.count().await > 0 {
        tracing::info!("Store already has threads, skipping seed");
        return Ok(0);
    }

    let threads = match &config.seed_file {
        Some(path) => load_file(path)?,
        None if config.seed_sample_data => sample_threads(),
        None => return Ok(0),
    };

    let inserted = threads.len();
    for thread in threads {
        store.insert_thread(thread).await;
    }
    tracing::info!(inserted, "Seeded threads");
    Ok(inserted)
}

/// JSON array of threads
pub fn load_file(path: &Path) -> Result<Vec<Thread>, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn reply(content: &str, author: &str, day: u32, hour: u32, min: u32) -> Reply {
    Reply {
        id: ulid::Ulid::new().to_string(),
        content: content.to_string(),
        author: author.to_string(),
        timestamp: Utc
            .with_ymd_and_hms(2023, 10, day, hour, min, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

#[allow(clippy::too_many_arguments)]
fn thread(
    title: &str,
    body: &str,
    author: &str,
    votes: u64,
    is_answered: bool,
    day: u32,
    hour: u32,
    replies: Vec<Reply>,
) -> Thread {
    Thread {
        id: ulid::Ulid::new().to_string(),
        title: title.to_string(),
        body: body.to_string(),
        author: author.to_string(),
        votes,
        is_answered,
        timestamp: Utc
            .with_ymd_and_hms(2023, 10, day, hour, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
        replies,
    }
}

pub fn sample_threads() -> Vec<Thread> {
    vec![
        thread(
            "How do I deploy Node.js on Cloud Run?",
            "I'm trying to deploy my Node.js application to Google Cloud Run but keep getting build errors. \
             The Dockerfile seems correct but the build fails during npm install. Any suggestions for troubleshooting this?",
            "Rohan",
            5,
            false,
            1,
            9,
            vec![
                reply(
                    "Use gcloud CLI with region flag: gcloud run deploy --region us-central1 --source .",
                    "Alex",
                    1,
                    10,
                    0,
                ),
                reply(
                    "Make sure to enable Cloud Build first in your project! Also check your billing is set up properly.",
                    "Sarah",
                    1,
                    11,
                    30,
                ),
                reply(
                    "Check your .dockerignore file - sometimes it excludes necessary files for the build.",
                    "Mike",
                    1,
                    14,
                    15,
                ),
            ],
        ),
        thread(
            "Best practices for React component structure?",
            "What are the current best practices for organizing React components in a large application? \
             Should I use atomic design, feature-based folders, or something else?",
            "Maya",
            3,
            true,
            2,
            14,
            vec![
                reply(
                    "I recommend using feature-based folder structure and keeping components small and focused.",
                    "John",
                    2,
                    15,
                    0,
                ),
                reply(
                    "Atomic design works well for design systems, but for business applications, feature-based organization is more maintainable.",
                    "Lisa",
                    2,
                    16,
                    30,
                ),
            ],
        ),
        thread(
            "Tailwind CSS vs traditional CSS?",
            "Is it worth switching a mid-sized project from hand-written stylesheets to Tailwind?",
            "Dev",
            1,
            false,
            3,
            8,
            Vec::new(),
        ),
    ]
}
