//! Learning session management for spaced repetition practice.
//! Handles multi-round flashcard review with SM-2 algorithm integration.

use super::sm2::{Quality, ReviewOutcome};
use super::{Flashcard, LearningCard};
use crate::database::db;
use crate::error::StoreError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Manages a learning session with multiple review rounds.
/// Cards that aren't mastered (grade < 3) are repeated in subsequent rounds.
pub struct LearningSession {
    pub deck_title: String,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
}

impl LearningSession {
    /// Creates a new learning session from cards that are due for review.
    pub fn new_from_due_cards(
        deck_title: String,
        cards: Vec<(i64, Flashcard)>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let all_cards: Vec<_> = cards
            .into_iter()
            .map(|(id, card)| LearningCard::new(id, card))
            .collect();

        let indices: Vec<usize> = (0..all_cards.len()).collect();

        Self {
            deck_title,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            conn,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn toggle_back(&mut self) {
        self.show_back = !self.show_back;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_back = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that weren't mastered.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.all_cards.get(idx).is_some_and(|card| !card.is_learned))
            .collect();

        if failed_indices.is_empty() {
            return;
        }

        debug!(
            deck = %self.deck_title,
            round = self.round_number + 1,
            cards = failed_indices.len(),
            "starting retry round"
        );
        self.current_round_cards = failed_indices;
        self.current_index = 0;
        self.show_back = false;
        self.round_number += 1;
    }

    /// Grades the current card.
    ///
    /// Only the first round persists a review through the store. Retry rounds
    /// decide whether the card is learned for this session and leave its
    /// schedule as the first grade set it, so a card failed and then recalled
    /// minutes later stays due tomorrow.
    ///
    /// Returns `Ok(None)` when there is no current card or the grade was a
    /// retry. An invalid quality is rejected before anything is written.
    pub fn grade_current_card(&mut self, quality: i64) -> Result<Option<ReviewOutcome>, StoreError> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.all_cards.get_mut(idx) else {
            return Ok(None);
        };
        let passed = Quality::try_from(quality)?.is_success();

        if self.round_number > 1 {
            card.mark_retry(passed);
            debug!(flashcard_id = card.id, quality, "retry graded, schedule kept");
            return Ok(None);
        }

        let outcome = {
            let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            db::record_review(card.id, quality, &mut conn)?
        };

        card.record(&outcome, passed);
        Ok(Some(outcome))
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.all_cards.get(idx).is_some_and(|card| card.is_learned))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// Returns true when the current round is empty or all its cards are learned.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
