pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod telemetry;

pub use error::{ConfigError, ExportError, ScheduleError, StoreError};
pub use models::{Deck, Difficulty, Flashcard, LearningCard, LearningSession, compute_next_review};
