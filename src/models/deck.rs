//! Deck is a titled set of flashcards
use super::Flashcard;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cards: Vec<Flashcard>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_studied: Option<DateTime<Utc>>,
}

impl Deck {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            description: String::new(),
            category: String::new(),
            cards: Vec::new(),
            created_at: now,
            updated_at: now,
            last_studied: None,
        }
    }

    /// Percentage (0-100) of cards that have been studied and are not due at `now`.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.cards.is_empty() {
            return 0.0;
        }
        let settled = self
            .cards
            .iter()
            .filter(|card| card.review_count > 0 && !card.is_due(now))
            .count();
        settled as f64 * 100.0 / self.cards.len() as f64
    }

    pub fn due_count(&self, now: DateTime<Utc>) -> usize {
        self.cards.iter().filter(|card| card.is_due(now)).count()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new("My Deck")
    }
}
