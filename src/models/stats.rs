//! Review statistics for a deck or the whole collection.
use serde::{Deserialize, Serialize};

/// Cards at or above this interval (days) count as in long-term review.
pub const MATURE_INTERVAL_DAYS: u32 = 21;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub review_cards: usize,
    pub due_cards: usize,
    pub reviews_today: usize,
    pub correct_today: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Length of the run of consecutive days ending today, or yesterday when
/// nothing has been reviewed today yet.
///
/// `days` are day numbers (days since the epoch) sorted descending, without duplicates.
pub fn current_streak(days: &[i64], today: i64) -> u32 {
    let Some(&latest) = days.first() else {
        return 0;
    };
    if latest != today && latest != today - 1 {
        return 0;
    }
    let mut streak = 1;
    for pair in days.windows(2) {
        if pair[0] - pair[1] != 1 {
            break;
        }
        streak += 1;
    }
    streak
}

/// Longest run of consecutive days. `days` sorted descending, without duplicates.
pub fn longest_streak(days: &[i64]) -> u32 {
    if days.is_empty() {
        return 0;
    }
    let mut longest = 1;
    let mut run = 1;
    for pair in days.windows(2) {
        if pair[0] - pair[1] == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }
    longest
}
