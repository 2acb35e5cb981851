//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each card has an ease factor (EF) that is adjusted after every review, pass or fail
//! - Quality grades 0-2: interval drops back to 1 day
//! - Quality grades 3-5: interval grows by review count (1 day → 6 days → EF multiplier)
//! - EF never falls below 1.3
//! - Every review counts towards the review count, including failures

use super::ReviewState;
use crate::error::ScheduleError;
use chrono::{DateTime, Duration, Utc};

/// Lower bound for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Upper bound for an interval, in days. Keeps `next_review_date` representable.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Learner's self-reported recall, 0 (blackout) to 5 (perfect).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }

    /// 3 and above counts as a successful recall.
    pub fn is_success(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<i64> for Quality {
    type Error = ScheduleError;

    fn try_from(quality: i64) -> Result<Self, Self::Error> {
        match u8::try_from(quality) {
            Ok(q) if q <= Self::MAX => Ok(Self(q)),
            _ => Err(ScheduleError::InvalidInput { quality }),
        }
    }
}

/// Result of one review: the card's new scheduling state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReviewOutcome {
    pub ease_factor: f64,
    pub interval: u32,
    pub review_count: u32,
    pub last_reviewed: DateTime<Utc>,
    pub next_review_date: DateTime<Utc>,
}

impl ReviewOutcome {
    pub fn state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval: self.interval,
            review_count: self.review_count,
        }
    }
}

/// Calculates the card's next scheduling state according to SM-2.
///
/// `quality` must be in 0..=5; anything else is rejected before any
/// computation happens.
pub fn compute_next_review(
    quality: i64,
    current: &ReviewState,
    reviewed_at: DateTime<Utc>,
) -> Result<ReviewOutcome, ScheduleError> {
    let quality = Quality::try_from(quality)?;

    let q = f64::from(quality.value());
    let ease_factor =
        (current.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_EASE_FACTOR);

    let interval = if quality.is_success() {
        match current.review_count {
            0 => 1,
            1 => 6,
            // `as` saturates on overflow, the cap below takes care of the rest
            _ => ((f64::from(current.interval) * ease_factor).round() as u32).max(1),
        }
    } else {
        1
    };
    let interval = interval.min(MAX_INTERVAL_DAYS);

    Ok(ReviewOutcome {
        ease_factor,
        interval,
        review_count: current.review_count.saturating_add(1),
        last_reviewed: reviewed_at,
        next_review_date: reviewed_at + Duration::days(i64::from(interval)),
    })
}

/// Interval each quality grade would produce, indexed by quality (0-5).
pub fn preview_intervals(current: &ReviewState) -> [u32; 6] {
    let now = Utc::now();
    let mut intervals = [0; 6];
    for (quality, slot) in (0i64..).zip(intervals.iter_mut()) {
        if let Ok(outcome) = compute_next_review(quality, current, now) {
            *slot = outcome.interval;
        }
    }
    intervals
}

/// Formats an interval in days as a compact label (`now`, `3d`, `2w`, `4mo`, `1y`).
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
