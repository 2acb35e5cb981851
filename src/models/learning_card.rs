//! Wrapper for flashcards that tracks progress within one study session.
use super::Flashcard;
use super::sm2::ReviewOutcome;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub id: i64,
    pub flashcard: Flashcard,
    pub is_learned: bool,
    pub last_learned_at: Option<DateTime<Utc>>,
}

impl LearningCard {
    pub fn new(id: i64, flashcard: Flashcard) -> Self {
        Self {
            id,
            flashcard,
            is_learned: false,
            last_learned_at: None,
        }
    }

    /// Copies the stored outcome into the in-memory card and marks it learned
    /// for this session when the recall succeeded.
    pub fn record(&mut self, outcome: &ReviewOutcome, passed: bool) {
        self.flashcard.apply(outcome);
        self.is_learned = passed;
        if passed {
            self.last_learned_at = Some(outcome.last_reviewed);
        }
    }

    /// Retry grades only change the session state.
    pub fn mark_retry(&mut self, passed: bool) {
        self.is_learned = passed;
    }
}
