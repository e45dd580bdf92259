//! Per-User Progress Store
//!
//! Mirrors each user's course scores per session, with the time of the last
//! update, into a JSON file. This is the identity-side record; the dialogue
//! engine keeps its own per-session score file.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tutor_core::persist;
use utoipa::ToSchema;

/// Scores recorded for one session of a user.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SessionProgress {
    /// Latest score per course.
    pub scores: BTreeMap<String, u32>,
    pub last_updated: DateTime<Utc>,
}

/// Everything recorded for a single user.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default, PartialEq)]
pub struct UserProgress {
    pub sessions: BTreeMap<String, SessionProgress>,
}

type ProgressBook = BTreeMap<String, UserProgress>;

/// File-backed store of user progress.
pub struct ProgressStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Upserts `score` for `course` in the user's session and stamps the update time.
    pub async fn record(&self, user_id: &str, session_id: &str, course: &str, score: u32) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut book: ProgressBook = persist::read_or_init(&self.path).await?;

        let session = book
            .entry(user_id.to_string())
            .or_default()
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionProgress {
                scores: BTreeMap::new(),
                last_updated: Utc::now(),
            });
        session.scores.insert(course.to_string(), score);
        session.last_updated = Utc::now();

        persist::write_pretty(&self.path, &book).await
    }

    /// Returns the user's progress; empty if nothing was recorded yet.
    pub async fn user(&self, user_id: &str) -> Result<UserProgress> {
        let _guard = self.lock.lock().await;
        let mut book: ProgressBook = persist::read_or_init(&self.path).await?;
        Ok(book.remove(user_id).unwrap_or_default())
    }
}
