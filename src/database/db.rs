//! Database operations for the review scheduler
//!
//! Handles SQLite database initialization, CRUD operations for decks and flashcards,
//! SM-2 review state persistence and the review log.

use crate::config::StudyLimits;
use crate::error::StoreError;
use crate::models::sm2::{MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, ReviewOutcome, compute_next_review};
use crate::models::stats::{MATURE_INTERVAL_DAYS, ReviewStats, current_streak, longest_streak};
use crate::models::{Deck, Difficulty, Flashcard, ReviewData, ReviewState};
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use tracing::{debug, info, warn};

pub type Result<T> = std::result::Result<T, StoreError>;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const FLASHCARD_COLUMNS: &str = "f.id, f.front, f.back, f.difficulty, r.ease_factor, r.interval_days, \
     r.review_count, r.last_reviewed, r.next_review";

impl ToSql for Difficulty {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Difficulty {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn timestamp_from_secs(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Reads a unix-seconds column as a UTC timestamp.
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        None => Ok(None),
        Some(secs) => timestamp_from_secs(secs).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Integer,
                Box::new(StoreError::InvalidTimestamp(secs)),
            )
        }),
    }
}

fn required_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    timestamp_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".to_string(),
        Type::Null,
    ))
}

/// Maps a row selected with `FLASHCARD_COLUMNS`.
fn flashcard_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Flashcard)> {
    Ok((
        row.get(0)?,
        Flashcard {
            front: row.get(1)?,
            back: row.get(2)?,
            difficulty: row.get(3)?,
            ease_factor: row.get(4)?,
            interval: row.get(5)?,
            review_count: row.get(6)?,
            last_reviewed: timestamp_column(row, 7)?,
            next_review: timestamp_column(row, 8)?,
        },
    ))
}

/// Opens (or creates) the SQLite database at `path` and ensures the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Fresh in-memory database, used by tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for decks, flashcards, SM-2 review data, the review log and app state.
/// Sets the current date to now if not already initialized.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            last_studied INTEGER
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            difficulty TEXT NOT NULL DEFAULT 'medium',
            FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE,
            UNIQUE(deck_id, front)
        );

        CREATE TABLE IF NOT EXISTS review_data (
            flashcard_id INTEGER PRIMARY KEY,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            last_reviewed INTEGER,
            next_review INTEGER,
            version INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS review_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            flashcard_id INTEGER NOT NULL,
            quality INTEGER NOT NULL,
            ease_factor REAL NOT NULL,
            interval_days INTEGER NOT NULL,
            reviewed_at INTEGER NOT NULL,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![Utc::now().timestamp().to_string()],
    )?;

    Ok(())
}

/// Retrieves the simulated current date from the database
pub fn get_current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;

    let secs = value
        .parse::<i64>()
        .map_err(|_| StoreError::InvalidCurrentDate(value.clone()))?;
    timestamp_from_secs(secs).ok_or(StoreError::InvalidTimestamp(secs))
}

/// Sets the simulated current date.
pub fn set_current_date(date: DateTime<Utc>, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
        params![date.timestamp().to_string()],
    )?;
    Ok(())
}

/// Advances the current date by 24 hours and returns the new date.
pub fn advance_day(conn: &Connection) -> Result<DateTime<Utc>> {
    let next_day = get_current_date(conn)? + Duration::days(1);
    set_current_date(next_day, conn)?;
    debug!(date = %next_day, "advanced current date");
    Ok(next_day)
}

/// Creates a new deck and returns its id.
pub fn new_deck(title: &str, description: &str, category: &str, conn: &Connection) -> Result<i64> {
    if find_deck_id(title, conn)?.is_some() {
        return Err(StoreError::DuplicateDeck(title.to_string()));
    }
    let now = get_current_date(conn)?.timestamp();
    conn.execute(
        "INSERT INTO decks (title, description, category, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![title, description, category, now],
    )?;
    info!(deck = title, "deck created");
    Ok(conn.last_insert_rowid())
}

fn find_deck_id(title: &str, conn: &Connection) -> Result<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM decks WHERE title = ?1", params![title], |row| {
            row.get(0)
        })
        .optional()?)
}

pub fn get_deck_id(title: &str, conn: &Connection) -> Result<i64> {
    find_deck_id(title, conn)?.ok_or_else(|| StoreError::DeckNotFound(title.to_string()))
}

/// Deletes a deck together with its cards, their review data and review log.
pub fn delete_deck(title: &str, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM decks WHERE title = ?1", params![title])?;
    if deleted == 0 {
        return Err(StoreError::DeckNotFound(title.to_string()));
    }
    info!(deck = title, "deck deleted");
    Ok(())
}

/// Adds a flashcard to a deck and initializes its SM-2 review data
///
/// Returns the flashcard ID. If a card with the same front already exists in
/// the deck, it is left as it is and its ID is returned.
pub fn add_flashcard(
    deck_title: &str,
    front: &str,
    back: &str,
    difficulty: Difficulty,
    conn: &Connection,
) -> Result<i64> {
    let deck_id = get_deck_id(deck_title, conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_id, front, back, difficulty) VALUES (?1, ?2, ?3, ?4)",
        params![deck_id, front, back, difficulty],
    )?;

    let flashcard_id: i64 = conn.query_row(
        "SELECT id FROM flashcards WHERE deck_id = ?1 AND front = ?2",
        params![deck_id, front],
        |row| row.get(0),
    )?;

    let state = ReviewState::default();
    conn.execute(
        "INSERT OR IGNORE INTO review_data (flashcard_id, ease_factor, interval_days, review_count)
         VALUES (?1, ?2, ?3, ?4)",
        params![flashcard_id, state.ease_factor, state.interval, state.review_count],
    )?;
    touch_deck(deck_id, conn)?;

    debug!(deck = deck_title, flashcard_id, "flashcard added");
    Ok(flashcard_id)
}

/// Rejects scheduling state the scheduler itself could never have produced.
fn check_schedule(card: &Flashcard) -> Result<()> {
    let next_mismatch = match (card.last_reviewed, card.next_review) {
        (Some(last), Some(next)) => {
            last.checked_add_signed(Duration::days(i64::from(card.interval))) != Some(next)
        }
        _ => false,
    };

    let reason = if card.ease_factor.is_nan() || card.ease_factor < MIN_EASE_FACTOR {
        format!("ease factor {} is below {}", card.ease_factor, MIN_EASE_FACTOR)
    } else if card.interval > MAX_INTERVAL_DAYS {
        format!("interval {} exceeds {} days", card.interval, MAX_INTERVAL_DAYS)
    } else if card.review_count > 0 && card.interval == 0 {
        format!("interval is 0 after {} review(s)", card.review_count)
    } else if next_mismatch {
        format!("next review is not last review + {} day(s)", card.interval)
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidSchedule {
        front: card.front.clone(),
        reason,
    })
}

/// Inserts a card together with its existing scheduling state (used by import).
/// The state must be consistent; see [`StoreError::InvalidSchedule`].
pub fn insert_flashcard(deck_id: i64, card: &Flashcard, conn: &Connection) -> Result<i64> {
    check_schedule(card)?;
    conn.execute(
        "INSERT INTO flashcards (deck_id, front, back, difficulty) VALUES (?1, ?2, ?3, ?4)",
        params![deck_id, card.front, card.back, card.difficulty],
    )?;
    let flashcard_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO review_data
            (flashcard_id, ease_factor, interval_days, review_count, last_reviewed, next_review)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            flashcard_id,
            card.ease_factor,
            card.interval,
            card.review_count,
            card.last_reviewed.map(|t| t.timestamp()),
            card.next_review.map(|t| t.timestamp()),
        ],
    )?;

    Ok(flashcard_id)
}

pub fn delete_flashcard(flashcard_id: i64, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM flashcards WHERE id = ?1", params![flashcard_id])?;
    if deleted == 0 {
        return Err(StoreError::CardNotFound(flashcard_id));
    }
    Ok(())
}

fn touch_deck(deck_id: i64, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE decks SET updated_at = ?1 WHERE id = ?2",
        params![get_current_date(conn)?.timestamp(), deck_id],
    )?;
    Ok(())
}

pub fn get_flashcard(flashcard_id: i64, conn: &Connection) -> Result<Flashcard> {
    let sql = format!(
        "SELECT {FLASHCARD_COLUMNS}
         FROM flashcards f
         JOIN review_data r ON f.id = r.flashcard_id
         WHERE f.id = ?1"
    );
    conn.query_row(&sql, params![flashcard_id], flashcard_from_row)
        .optional()?
        .map(|(_, card)| card)
        .ok_or(StoreError::CardNotFound(flashcard_id))
}

/// Retrieves all flashcards for a given deck, in insertion order
///
/// Returns vector of (flashcard_id, Flashcard) tuples
pub fn get_flashcards_for_deck(deck_title: &str, conn: &Connection) -> Result<Vec<(i64, Flashcard)>> {
    let deck_id = get_deck_id(deck_title, conn)?;
    let sql = format!(
        "SELECT {FLASHCARD_COLUMNS}
         FROM flashcards f
         JOIN review_data r ON f.id = r.flashcard_id
         WHERE f.deck_id = ?1
         ORDER BY f.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let flashcards = stmt
        .query_map(params![deck_id], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(flashcards)
}

pub fn get_review_data(flashcard_id: i64, conn: &Connection) -> Result<ReviewData> {
    conn.query_row(
        "SELECT ease_factor, interval_days, review_count, last_reviewed, next_review, version
         FROM review_data WHERE flashcard_id = ?1",
        params![flashcard_id],
        |row| {
            Ok(ReviewData {
                flashcard_id,
                state: ReviewState {
                    ease_factor: row.get(0)?,
                    interval: row.get(1)?,
                    review_count: row.get(2)?,
                },
                last_reviewed: timestamp_column(row, 3)?,
                next_review: timestamp_column(row, 4)?,
                version: row.get(5)?,
            })
        },
    )
    .optional()?
    .ok_or(StoreError::CardNotFound(flashcard_id))
}

/// Writes review data only if nobody else has written it since
/// `expected_version` was read. Returns the new version.
pub fn update_review_data(review_data: &ReviewData, expected_version: i64, conn: &Connection) -> Result<i64> {
    let updated = conn.execute(
        "UPDATE review_data
         SET ease_factor = ?1, interval_days = ?2, review_count = ?3,
             last_reviewed = ?4, next_review = ?5, version = version + 1
         WHERE flashcard_id = ?6 AND version = ?7",
        params![
            review_data.state.ease_factor,
            review_data.state.interval,
            review_data.state.review_count,
            review_data.last_reviewed.map(|t| t.timestamp()),
            review_data.next_review.map(|t| t.timestamp()),
            review_data.flashcard_id,
            expected_version,
        ],
    )?;

    if updated == 0 {
        // either the card is gone or someone else got there first
        get_review_data(review_data.flashcard_id, conn)?;
        warn!(
            flashcard_id = review_data.flashcard_id,
            expected_version, "stale review data write rejected"
        );
        return Err(StoreError::StaleReview {
            flashcard_id: review_data.flashcard_id,
            expected_version,
        });
    }

    Ok(expected_version + 1)
}

/// Applies one review to a card: read, schedule, write, log.
///
/// Runs in an IMMEDIATE transaction so the write lock is held from the read
/// onwards; concurrent reviews of the same card are serialized. An invalid
/// quality aborts before anything is written.
pub fn record_review(flashcard_id: i64, quality: i64, conn: &mut Connection) -> Result<ReviewOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = get_review_data(flashcard_id, &tx)?;
    let reviewed_at = get_current_date(&tx)?;
    let outcome = compute_next_review(quality, &current.state, reviewed_at)?;

    let updated = ReviewData {
        flashcard_id,
        state: outcome.state(),
        last_reviewed: Some(outcome.last_reviewed),
        next_review: Some(outcome.next_review_date),
        version: current.version + 1,
    };
    update_review_data(&updated, current.version, &tx)?;

    tx.execute(
        "INSERT INTO review_log (flashcard_id, quality, ease_factor, interval_days, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            flashcard_id,
            quality,
            outcome.ease_factor,
            outcome.interval,
            reviewed_at.timestamp()
        ],
    )?;
    tx.execute(
        "UPDATE decks SET last_studied = ?1
         WHERE id = (SELECT deck_id FROM flashcards WHERE id = ?2)",
        params![reviewed_at.timestamp(), flashcard_id],
    )?;

    tx.commit()?;

    info!(
        flashcard_id,
        quality,
        interval = outcome.interval,
        ease_factor = outcome.ease_factor,
        review_count = outcome.review_count,
        "review recorded"
    );
    Ok(outcome)
}

/// Retrieves flashcards due for review in a deck
///
/// Previously reviewed cards whose next review has arrived come first, oldest
/// first, capped at `reviews_per_day`; never-studied cards follow in insertion
/// order, capped at `new_cards_per_day`.
pub fn get_flashcards_due_for_review(
    deck_title: &str,
    limits: &StudyLimits,
    conn: &Connection,
) -> Result<Vec<(i64, Flashcard)>> {
    let deck_id = get_deck_id(deck_title, conn)?;
    let now = get_current_date(conn)?.timestamp();

    let review_sql = format!(
        "SELECT {FLASHCARD_COLUMNS}
         FROM flashcards f
         JOIN review_data r ON f.id = r.flashcard_id
         WHERE f.deck_id = ?1 AND r.next_review IS NOT NULL AND r.next_review <= ?2
         ORDER BY r.next_review ASC, f.id ASC
         LIMIT ?3"
    );
    let mut stmt = conn.prepare(&review_sql)?;
    let mut flashcards = stmt
        .query_map(params![deck_id, now, limits.reviews_per_day], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let new_sql = format!(
        "SELECT {FLASHCARD_COLUMNS}
         FROM flashcards f
         JOIN review_data r ON f.id = r.flashcard_id
         WHERE f.deck_id = ?1 AND r.next_review IS NULL
         ORDER BY f.id ASC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&new_sql)?;
    let new_cards = stmt
        .query_map(params![deck_id, limits.new_cards_per_day], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    flashcards.extend(new_cards);

    debug!(deck = deck_title, due = flashcards.len(), "loaded due flashcards");
    Ok(flashcards)
}

/// Retrieves all deck titles from database
pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT title FROM decks ORDER BY title")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(decks)
}

/// Loads one deck with its flashcards and their scheduling state.
pub fn load_deck(title: &str, conn: &Connection) -> Result<Deck> {
    let mut deck = conn
        .query_row(
            "SELECT title, description, category, created_at, updated_at, last_studied
             FROM decks WHERE title = ?1",
            params![title],
            |row| {
                Ok(Deck {
                    title: row.get(0)?,
                    description: row.get(1)?,
                    category: row.get(2)?,
                    cards: Vec::new(),
                    created_at: required_timestamp_column(row, 3)?,
                    updated_at: required_timestamp_column(row, 4)?,
                    last_studied: timestamp_column(row, 5)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::DeckNotFound(title.to_string()))?;

    deck.cards = get_flashcards_for_deck(title, conn)?
        .into_iter()
        .map(|(_, card)| card)
        .collect();
    Ok(deck)
}

/// Loads all decks with their flashcards into memory
pub fn load_all_decks(conn: &Connection) -> Result<Vec<Deck>> {
    get_all_decks(conn)?
        .iter()
        .map(|title| load_deck(title, conn))
        .collect()
}

/// Stores an imported deck as a new deck, keeping each card's scheduling state.
pub fn import_deck(deck: &Deck, conn: &mut Connection) -> Result<i64> {
    let tx = conn.transaction()?;
    let deck_id = new_deck(&deck.title, &deck.description, &deck.category, &tx)?;
    for card in &deck.cards {
        insert_flashcard(deck_id, card, &tx)?;
    }
    tx.execute(
        "UPDATE decks SET last_studied = ?1 WHERE id = ?2",
        params![deck.last_studied.map(|t| t.timestamp()), deck_id],
    )?;
    tx.commit()?;
    info!(deck = %deck.title, cards = deck.cards.len(), "deck imported");
    Ok(deck_id)
}

/// Computes review statistics for one deck, or for every deck when `deck_title` is `None`.
pub fn get_review_stats(deck_title: Option<&str>, conn: &Connection) -> Result<ReviewStats> {
    let deck_id = deck_title.map(|title| get_deck_id(title, conn)).transpose()?;
    let now = get_current_date(conn)?;
    let today = now.timestamp().div_euclid(SECONDS_PER_DAY);

    let mut stats = ReviewStats::default();

    let mut stmt = conn.prepare(
        "SELECT r.review_count, r.interval_days, r.next_review
         FROM flashcards f
         JOIN review_data r ON f.id = r.flashcard_id
         WHERE ?1 IS NULL OR f.deck_id = ?1",
    )?;
    let rows = stmt.query_map(params![deck_id], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, Option<i64>>(2)?,
        ))
    })?;
    for row in rows {
        let (review_count, interval, next_review) = row?;
        stats.total_cards += 1;
        if review_count == 0 {
            stats.new_cards += 1;
        } else if interval < MATURE_INTERVAL_DAYS {
            stats.learning_cards += 1;
        } else {
            stats.review_cards += 1;
        }
        if next_review.is_none_or(|next| next <= now.timestamp()) {
            stats.due_cards += 1;
        }
    }

    let (reviews_today, correct_today): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(l.quality >= 3), 0)
         FROM review_log l
         JOIN flashcards f ON f.id = l.flashcard_id
         WHERE (?1 IS NULL OR f.deck_id = ?1)
           AND l.reviewed_at >= ?2 AND l.reviewed_at < ?3",
        params![deck_id, today * SECONDS_PER_DAY, (today + 1) * SECONDS_PER_DAY],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    stats.reviews_today = reviews_today as usize;
    stats.correct_today = correct_today as usize;

    let mut stmt = conn.prepare(
        "SELECT DISTINCT l.reviewed_at / ?2 AS day
         FROM review_log l
         JOIN flashcards f ON f.id = l.flashcard_id
         WHERE ?1 IS NULL OR f.deck_id = ?1
         ORDER BY day DESC",
    )?;
    let days = stmt
        .query_map(params![deck_id, SECONDS_PER_DAY], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    stats.current_streak = current_streak(&days, today);
    stats.longest_streak = longest_streak(&days);

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
    }

    fn setup() -> Connection {
        let conn = open_in_memory().unwrap();
        set_current_date(start_date(), &conn).unwrap();
        new_deck("Polish Vocabulary", "Basics", "Languages", &conn).unwrap();
        conn
    }

    #[test]
    fn test_new_card_has_default_review_data() {
        let conn = setup();
        let id = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();

        let data = get_review_data(id, &conn).unwrap();
        assert_eq!(data.state, ReviewState::default());
        assert_eq!(data.last_reviewed, None);
        assert_eq!(data.next_review, None);
        assert_eq!(data.version, 0);

        let card = get_flashcard(id, &conn).unwrap();
        assert_eq!(card.difficulty, Difficulty::Easy);
        assert_eq!(card.back, "hello");
    }

    #[test]
    fn test_duplicate_front_is_ignored() {
        let conn = setup();
        let first = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();
        let second = add_flashcard("Polish Vocabulary", "cześć", "hi", Difficulty::Hard, &conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(get_flashcards_for_deck("Polish Vocabulary", &conn).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_deck() {
        let conn = setup();
        let err = add_flashcard("Nope", "a", "b", Difficulty::Medium, &conn).unwrap_err();
        assert!(matches!(err, StoreError::DeckNotFound(title) if title == "Nope"));
        assert!(matches!(
            new_deck("Polish Vocabulary", "", "", &conn),
            Err(StoreError::DuplicateDeck(_))
        ));
    }

    #[test]
    fn test_record_review_walks_the_schedule() {
        let mut conn = setup();
        let id = add_flashcard("Polish Vocabulary", "proszę", "please", Difficulty::Medium, &conn).unwrap();

        let first = record_review(id, 4, &mut conn).unwrap();
        assert_eq!(first.interval, 1);
        assert_eq!(first.next_review_date, start_date() + Duration::days(1));

        advance_day(&conn).unwrap();
        let second = record_review(id, 4, &mut conn).unwrap();
        assert_eq!(second.interval, 6);

        let third = record_review(id, 4, &mut conn).unwrap();
        assert_eq!(third.interval, 15);
        assert_eq!(third.review_count, 3);

        let stored = get_review_data(id, &conn).unwrap();
        assert_eq!(stored.state, third.state());
        assert_eq!(stored.last_reviewed, Some(third.last_reviewed));
        assert_eq!(stored.next_review, Some(third.next_review_date));
        assert_eq!(stored.version, 3);

        let deck = load_deck("Polish Vocabulary", &conn).unwrap();
        assert_eq!(deck.last_studied, Some(start_date() + Duration::days(1)));
    }

    #[test]
    fn test_invalid_quality_writes_nothing() {
        let mut conn = setup();
        let id = add_flashcard("Polish Vocabulary", "proszę", "please", Difficulty::Medium, &conn).unwrap();
        record_review(id, 5, &mut conn).unwrap();
        let before = get_review_data(id, &conn).unwrap();

        for quality in [-1, 6] {
            let err = record_review(id, quality, &mut conn).unwrap_err();
            assert!(matches!(err, StoreError::Schedule(_)));
        }

        assert_eq!(get_review_data(id, &conn).unwrap(), before);
        let logged: i64 = conn
            .query_row("SELECT COUNT(*) FROM review_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(logged, 1);
    }

    #[test]
    fn test_record_review_unknown_card() {
        let mut conn = setup();
        assert!(matches!(
            record_review(999, 4, &mut conn),
            Err(StoreError::CardNotFound(999))
        ));
    }

    #[test]
    fn test_stale_write_is_rejected() {
        let conn = setup();
        let id = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();

        // two reviewers read the same snapshot
        let snapshot = get_review_data(id, &conn).unwrap();
        let outcome_a = compute_next_review(5, &snapshot.state, start_date()).unwrap();
        let outcome_b = compute_next_review(1, &snapshot.state, start_date()).unwrap();

        let write = |outcome: &ReviewOutcome| ReviewData {
            flashcard_id: id,
            state: outcome.state(),
            last_reviewed: Some(outcome.last_reviewed),
            next_review: Some(outcome.next_review_date),
            version: snapshot.version + 1,
        };

        assert_eq!(update_review_data(&write(&outcome_a), snapshot.version, &conn).unwrap(), 1);
        let err = update_review_data(&write(&outcome_b), snapshot.version, &conn).unwrap_err();
        assert!(matches!(err, StoreError::StaleReview { flashcard_id, expected_version: 0 } if flashcard_id == id));

        let stored = get_review_data(id, &conn).unwrap();
        assert_eq!(stored.state, outcome_a.state());
    }

    #[test]
    fn test_due_cards_follow_current_date_and_limits() {
        let mut conn = setup();
        let ids: Vec<i64> = ["jeden", "dwa", "trzy", "cztery"]
            .iter()
            .map(|front| add_flashcard("Polish Vocabulary", front, "number", Difficulty::Medium, &conn).unwrap())
            .collect();
        let limits = StudyLimits {
            new_cards_per_day: 2,
            reviews_per_day: 10,
        };

        let due = get_flashcards_due_for_review("Polish Vocabulary", &limits, &conn).unwrap();
        assert_eq!(due.iter().map(|(id, _)| *id).collect::<Vec<_>>(), ids[..2]);

        record_review(ids[0], 5, &mut conn).unwrap();
        record_review(ids[1], 2, &mut conn).unwrap();

        // both reviewed cards are scheduled for tomorrow, two new cards remain
        let due = get_flashcards_due_for_review("Polish Vocabulary", &limits, &conn).unwrap();
        assert_eq!(due.iter().map(|(id, _)| *id).collect::<Vec<_>>(), ids[2..]);

        advance_day(&conn).unwrap();
        let due = get_flashcards_due_for_review("Polish Vocabulary", &limits, &conn).unwrap();
        assert_eq!(due.len(), 4);
        assert_eq!(due[0].1.review_count, 1);
        assert_eq!(due[1].1.review_count, 1);
        assert_eq!(due[2].0, ids[2]);
    }

    #[test]
    fn test_delete_deck_cascades() {
        let mut conn = setup();
        let id = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();
        record_review(id, 4, &mut conn).unwrap();

        delete_deck("Polish Vocabulary", &conn).unwrap();

        assert!(get_all_decks(&conn).unwrap().is_empty());
        assert!(matches!(get_review_data(id, &conn), Err(StoreError::CardNotFound(_))));
        let logged: i64 = conn
            .query_row("SELECT COUNT(*) FROM review_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(logged, 0);
        assert!(matches!(delete_deck("Polish Vocabulary", &conn), Err(StoreError::DeckNotFound(_))));
    }

    #[test]
    fn test_delete_flashcard() {
        let conn = setup();
        let id = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();
        delete_flashcard(id, &conn).unwrap();
        assert!(matches!(get_flashcard(id, &conn), Err(StoreError::CardNotFound(_))));
        assert!(matches!(delete_flashcard(id, &conn), Err(StoreError::CardNotFound(_))));
    }

    #[test]
    fn test_import_keeps_schedule() {
        let mut conn = setup();
        let mut deck = Deck::new("History - World War II");
        deck.category = "History".into();
        let mut card = Flashcard::new("Date of Pearl Harbor?", "December 7, 1941", Difficulty::Medium);
        card.review(5, start_date()).unwrap();
        deck.cards.push(card.clone());
        deck.cards.push(Flashcard::new("Major Allied powers?", "US, UK, USSR", Difficulty::Easy));

        import_deck(&deck, &mut conn).unwrap();

        let loaded = load_deck("History - World War II", &conn).unwrap();
        assert_eq!(loaded.category, "History");
        assert_eq!(loaded.cards.len(), 2);
        assert_eq!(loaded.cards[0], card);
        assert_eq!(loaded.cards[1].review_count, 0);

        assert!(matches!(import_deck(&deck, &mut conn), Err(StoreError::DuplicateDeck(_))));
        assert_eq!(load_all_decks(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_import_rejects_inconsistent_schedule() {
        let mut conn = setup();
        let mut deck = Deck::new("Chemistry");
        deck.cards.push(Flashcard::new("H2O?", "water", Difficulty::Easy));
        let mut broken = Flashcard::new("NaCl?", "salt", Difficulty::Easy);
        broken.ease_factor = 0.4;
        broken.review_count = 3;
        broken.interval = 0;
        broken.last_reviewed = Some(start_date());
        broken.next_review = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        deck.cards.push(broken);

        let err = import_deck(&deck, &mut conn).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSchedule { ref front, .. } if front == "NaCl?"));
        // the whole import is rolled back
        assert!(matches!(get_deck_id("Chemistry", &conn), Err(StoreError::DeckNotFound(_))));

        let cases: [fn(&mut Flashcard); 3] = [
            |card| card.interval = 0,
            |card| card.interval = MAX_INTERVAL_DAYS + 1,
            |card| card.next_review = card.last_reviewed,
        ];
        for corrupt in cases {
            let mut card = Flashcard::new("NaCl?", "salt", Difficulty::Easy);
            card.review(4, start_date()).unwrap();
            corrupt(&mut card);
            deck.cards[1] = card;
            assert!(matches!(
                import_deck(&deck, &mut conn),
                Err(StoreError::InvalidSchedule { .. })
            ));
        }

        let mut card = Flashcard::new("NaCl?", "salt", Difficulty::Easy);
        card.review(0, start_date()).unwrap();
        card.ease_factor = MIN_EASE_FACTOR;
        deck.cards[1] = card;
        import_deck(&deck, &mut conn).unwrap();
    }

    #[test]
    fn test_corrupt_current_date_is_an_error() {
        let mut conn = setup();
        let id = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();
        conn.execute("UPDATE app_state SET value = 'yesterday' WHERE key = 'current_date'", [])
            .unwrap();

        assert!(matches!(
            get_current_date(&conn),
            Err(StoreError::InvalidCurrentDate(value)) if value == "yesterday"
        ));
        assert!(matches!(
            record_review(id, 4, &mut conn),
            Err(StoreError::InvalidCurrentDate(_))
        ));
        assert_eq!(get_review_data(id, &conn).unwrap().state.review_count, 0);
    }

    #[test]
    fn test_review_stats() {
        let mut conn = setup();
        new_deck("Biology", "", "Science", &conn).unwrap();
        let a = add_flashcard("Polish Vocabulary", "cześć", "hello", Difficulty::Easy, &conn).unwrap();
        let b = add_flashcard("Polish Vocabulary", "proszę", "please", Difficulty::Easy, &conn).unwrap();
        add_flashcard("Polish Vocabulary", "dziękuję", "thank you", Difficulty::Easy, &conn).unwrap();
        add_flashcard("Biology", "mitochondria", "powerhouse", Difficulty::Easy, &conn).unwrap();

        record_review(a, 5, &mut conn).unwrap();
        advance_day(&conn).unwrap();
        record_review(a, 5, &mut conn).unwrap();
        record_review(b, 1, &mut conn).unwrap();

        let stats = get_review_stats(Some("Polish Vocabulary"), &conn).unwrap();
        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.new_cards, 1);
        assert_eq!(stats.learning_cards, 2);
        assert_eq!(stats.review_cards, 0);
        // only the never-studied card is due right now
        assert_eq!(stats.due_cards, 1);
        assert_eq!(stats.reviews_today, 2);
        assert_eq!(stats.correct_today, 1);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);

        let all = get_review_stats(None, &conn).unwrap();
        assert_eq!(all.total_cards, 4);
        assert_eq!(all.new_cards, 2);

        let biology = get_review_stats(Some("Biology"), &conn).unwrap();
        assert_eq!(biology.reviews_today, 0);
        assert_eq!(biology.current_streak, 0);
    }
}
