//! Scheduling state of a single flashcard.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor every card starts with.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// The three numbers the scheduler reads: everything it needs to know about
/// a card's history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub ease_factor: f64,
    /// Days between the last review and the next one.
    pub interval: u32,
    pub review_count: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            review_count: 0,
        }
    }
}

/// Persisted scheduling snapshot of one flashcard.
///
/// `version` is bumped by every write so that concurrent reviewers of the
/// same card can detect a lost update.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewData {
    pub flashcard_id: i64,
    pub state: ReviewState,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    pub version: i64,
}

impl ReviewData {
    pub fn new(flashcard_id: i64) -> Self {
        Self {
            flashcard_id,
            state: ReviewState::default(),
            last_reviewed: None,
            next_review: None,
            version: 0,
        }
    }
}
