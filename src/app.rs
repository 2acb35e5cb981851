//! Command-line front end: argument parsing, command dispatch and the
//! interactive study loop.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learnsphere_review::config::Config;
use learnsphere_review::database::db;
use learnsphere_review::error::StoreError;
use learnsphere_review::export::json::{export_json_to_path, import_json};
use learnsphere_review::models::sm2::{format_interval, preview_intervals};
use learnsphere_review::models::{Difficulty, LearningSession};
use rusqlite::Connection;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "learnsphere")]
#[command(about = "Spaced repetition flashcards with SM-2 review scheduling")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to $LEARNSPHERE_CONFIG, then built-in defaults)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new deck
    NewDeck {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    /// List decks with card counts and progress
    Decks,
    /// Delete a deck and all of its cards
    DeleteDeck { title: String },
    /// Add a flashcard to a deck
    Add {
        deck: String,
        front: String,
        back: String,
        #[arg(long, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
    },
    /// List every card of a deck with its schedule
    Cards { deck: String },
    /// Show the cards of a deck that are due now
    Due { deck: String },
    /// Record a single review (quality 0-5) for a card
    Review {
        card_id: i64,
        #[arg(allow_negative_numbers = true)]
        quality: i64,
    },
    /// Study the due cards of a deck interactively
    Study { deck: String },
    /// Show review statistics
    Stats {
        #[arg(long)]
        deck: Option<String>,
    },
    /// Move the scheduler's current date forward by one day
    AdvanceDay,
    /// Export a deck to a JSON file
    Export { deck: String, path: PathBuf },
    /// Import a deck from a JSON file
    Import { path: PathBuf },
}

pub fn run<R: BufRead, W: Write>(
    command: Commands,
    config: &Config,
    mut conn: Connection,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::NewDeck {
            title,
            description,
            category,
        } => {
            db::new_deck(&title, &description, &category, &conn)?;
            writeln!(out, "Deck '{}' created.", title)?;
        }
        Commands::Decks => {
            let today = db::get_current_date(&conn)?;
            let decks = db::load_all_decks(&conn)?;
            if decks.is_empty() {
                writeln!(out, "No decks yet.")?;
            }
            for deck in &decks {
                writeln!(
                    out,
                    "{} ({} cards, {} due, {:.0}% progress)",
                    deck.title,
                    deck.cards.len(),
                    deck.due_count(today),
                    deck.progress(today)
                )?;
            }
        }
        Commands::DeleteDeck { title } => {
            db::delete_deck(&title, &conn)?;
            writeln!(out, "Deck '{}' deleted.", title)?;
        }
        Commands::Add {
            deck,
            front,
            back,
            difficulty,
        } => {
            let id = db::add_flashcard(&deck, &front, &back, difficulty, &conn)?;
            writeln!(out, "Card {} in '{}'.", id, deck)?;
        }
        Commands::Cards { deck } => {
            for (id, card) in db::get_flashcards_for_deck(&deck, &conn)? {
                let next = card
                    .next_review
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "new".to_string());
                writeln!(
                    out,
                    "{:>4}  {} -> {}  [{}] next: {}, interval {}, ease {:.2}, reviews {}",
                    id,
                    card.front,
                    card.back,
                    card.difficulty,
                    next,
                    format_interval(card.interval),
                    card.ease_factor,
                    card.review_count
                )?;
            }
        }
        Commands::Due { deck } => {
            let due = db::get_flashcards_due_for_review(&deck, &config.study, &conn)?;
            writeln!(out, "{} cards due in '{}'.", due.len(), deck)?;
            for (id, card) in due {
                let preview = preview_intervals(&card.review_state());
                writeln!(
                    out,
                    "{:>4}  {}  (again {} | hard {} | good {} | easy {})",
                    id,
                    card.front,
                    format_interval(preview[1]),
                    format_interval(preview[3]),
                    format_interval(preview[4]),
                    format_interval(preview[5])
                )?;
            }
        }
        Commands::Review { card_id, quality } => {
            let outcome = db::record_review(card_id, quality, &mut conn)?;
            writeln!(
                out,
                "Card {}: next review {} (interval {}, ease {:.2}, reviews {}).",
                card_id,
                outcome.next_review_date.format("%Y-%m-%d"),
                format_interval(outcome.interval),
                outcome.ease_factor,
                outcome.review_count
            )?;
        }
        Commands::Study { deck } => {
            let due = db::get_flashcards_due_for_review(&deck, &config.study, &conn)?;
            let mut session = LearningSession::new_from_due_cards(deck, due, Arc::new(Mutex::new(conn)));
            study(&mut session, input, out)?;
        }
        Commands::Stats { deck } => {
            let stats = db::get_review_stats(deck.as_deref(), &conn)?;
            writeln!(out, "Cards:          {}", stats.total_cards)?;
            writeln!(out, "  new:          {}", stats.new_cards)?;
            writeln!(out, "  learning:     {}", stats.learning_cards)?;
            writeln!(out, "  review:       {}", stats.review_cards)?;
            writeln!(out, "Due now:        {}", stats.due_cards)?;
            writeln!(out, "Reviews today:  {} ({} correct)", stats.reviews_today, stats.correct_today)?;
            writeln!(out, "Streak:         {} days (longest {})", stats.current_streak, stats.longest_streak)?;
        }
        Commands::AdvanceDay => {
            let date = db::advance_day(&conn)?;
            writeln!(out, "Current date: {}", date.format("%Y-%m-%d"))?;
        }
        Commands::Export { deck, path } => {
            let deck = db::load_deck(&deck, &conn)?;
            export_json_to_path(&deck, &path)
                .with_context(|| format!("exporting '{}' to {}", deck.title, path.display()))?;
            writeln!(out, "Deck '{}' exported to '{}'.", deck.title, path.display())?;
        }
        Commands::Import { path } => {
            let deck = import_json(&path).with_context(|| format!("reading {}", path.display()))?;
            db::import_deck(&deck, &mut conn)?;
            writeln!(out, "Deck '{}' imported from '{}'.", deck.title, path.display())?;
        }
    }
    Ok(())
}

/// Reads one trimmed line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Runs a study session on the terminal until every card is learned, the
/// learner types `q`, or input ends.
pub fn study<R: BufRead, W: Write>(
    session: &mut LearningSession,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Learning: {}", session.deck_title)?;
    if session.is_completed() {
        writeln!(out, "Nothing due. Come back later!")?;
        return Ok(());
    }

    let mut announced_round = 0;
    while !session.is_completed() {
        if announced_round != session.round_number {
            writeln!(out, "{}", session.phase_message())?;
            announced_round = session.round_number;
        }
        let Some(card) = session.current_card() else {
            break;
        };
        let front = card.flashcard.front.clone();
        let back = card.flashcard.back.clone();

        writeln!(out, "Q: {}", front)?;
        write!(out, "[Enter] show answer, [q] quit: ")?;
        out.flush()?;
        match read_line(input)?.as_deref() {
            None | Some("q") => return Ok(()),
            Some(_) => {}
        }

        session.toggle_back();
        writeln!(out, "A: {}", back)?;

        loop {
            write!(out, "Grade 0-5: ")?;
            out.flush()?;
            let Some(answer) = read_line(input)? else {
                return Ok(());
            };
            let Ok(quality) = answer.parse::<i64>() else {
                writeln!(out, "Please enter a number from 0 to 5.")?;
                continue;
            };
            match session.grade_current_card(quality) {
                Ok(_) => break,
                Err(StoreError::Schedule(e)) => writeln!(out, "{}", e)?,
                Err(e) => return Err(e.into()),
            }
        }

        writeln!(
            out,
            "Learned: {} / {} (remaining {})",
            session.learned_count(),
            session.total_count(),
            session.remaining_count()
        )?;
        session.next_card();
    }

    writeln!(out, "Session complete after {} round(s).", session.round_number)?;
    Ok(())
}
