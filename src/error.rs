//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// The only way the scheduler can fail: a quality score outside 0..=5.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid input: review quality {quality} is outside 0..=5")]
    InvalidInput { quality: i64 },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("deck not found: {0}")]
    DeckNotFound(String),

    #[error("deck already exists: {0}")]
    DuplicateDeck(String),

    #[error("flashcard not found: {0}")]
    CardNotFound(i64),

    #[error("review data for flashcard {flashcard_id} changed since version {expected_version} was read")]
    StaleReview {
        flashcard_id: i64,
        expected_version: i64,
    },

    #[error("database connection lock poisoned")]
    LockPoisoned,

    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("stored current date {0:?} is not a unix timestamp")]
    InvalidCurrentDate(String),

    #[error("card {front:?} has an inconsistent schedule: {reason}")]
    InvalidSchedule { front: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
