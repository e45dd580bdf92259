//! Score Recorder
//!
//! Persists the latest score of each session per course.

use crate::persist;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Session id -> course -> latest score.
pub type ScoreBook = BTreeMap<String, BTreeMap<String, u32>>;

/// Destination for per-session course scores.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreRecorder: Send + Sync {
    /// Upserts the score for `course` in `session_id`, leaving other entries intact.
    async fn record_score(&self, session_id: &str, course: &str, score: u32) -> Result<()>;
}

/// Stores scores in a pretty-printed JSON file.
///
/// Every update is a read-modify-write of the whole file, serialized by an
/// in-process lock so concurrent sessions never overwrite each other.
pub struct JsonScoreRecorder {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonScoreRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole score file.
    pub async fn load(&self) -> Result<ScoreBook> {
        let _guard = self.lock.lock().await;
        persist::read_or_init(&self.path).await
    }
}

#[async_trait]
impl ScoreRecorder for JsonScoreRecorder {
    async fn record_score(&self, session_id: &str, course: &str, score: u32) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut book: ScoreBook = persist::read_or_init(&self.path).await?;
        book.entry(session_id.to_string())
            .or_default()
            .insert(course.to_string(), score);
        persist::write_pretty(&self.path, &book).await
    }
}

/// Keeps scores in memory only.
#[derive(Default)]
pub struct InMemoryScoreRecorder {
    book: Mutex<ScoreBook>,
}

impl InMemoryScoreRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn score(&self, session_id: &str, course: &str) -> Option<u32> {
        self.book
            .lock()
            .await
            .get(session_id)
            .and_then(|courses| courses.get(course))
            .copied()
    }
}

#[async_trait]
impl ScoreRecorder for InMemoryScoreRecorder {
    async fn record_score(&self, session_id: &str, course: &str, score: u32) -> Result<()> {
        self.book
            .lock()
            .await
            .entry(session_id.to_string())
            .or_default()
            .insert(course.to_string(), score);
        Ok(())
    }
}
