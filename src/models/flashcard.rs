//! Flashcard is a pair <front, back> plus the spaced repetition state the scheduler works on.
use super::ReviewState;
use super::sm2::{ReviewOutcome, compute_next_review};
use crate::error::ScheduleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authored difficulty tag. Independent of review history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty '{0}', expected easy, medium or hard")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    #[serde(default)]
    pub interval: u32,
}

fn default_ease_factor() -> f64 {
    super::review_data::DEFAULT_EASE_FACTOR
}

impl Flashcard {
    /// A card that has never been studied.
    pub fn new(front: impl Into<String>, back: impl Into<String>, difficulty: Difficulty) -> Self {
        let state = ReviewState::default();
        Self {
            front: front.into(),
            back: back.into(),
            difficulty,
            last_reviewed: None,
            next_review: None,
            review_count: state.review_count,
            ease_factor: state.ease_factor,
            interval: state.interval,
        }
    }

    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval: self.interval,
            review_count: self.review_count,
        }
    }

    /// Never studied, or the scheduled date has arrived.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_none_or(|next| next <= now)
    }

    /// Runs the scheduler on this card. The card is left untouched when the
    /// quality is rejected.
    pub fn review(
        &mut self,
        quality: i64,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReviewOutcome, ScheduleError> {
        let outcome = compute_next_review(quality, &self.review_state(), reviewed_at)?;
        self.apply(&outcome);
        Ok(outcome)
    }

    pub fn apply(&mut self, outcome: &ReviewOutcome) {
        self.ease_factor = outcome.ease_factor;
        self.interval = outcome.interval;
        self.review_count = outcome.review_count;
        self.last_reviewed = Some(outcome.last_reviewed);
        self.next_review = Some(outcome.next_review_date);
    }
}
