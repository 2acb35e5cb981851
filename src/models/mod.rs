pub mod deck;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod review_data;
pub mod sm2;
pub mod stats;

pub use deck::Deck;
pub use flashcard::{Difficulty, Flashcard};
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use review_data::{ReviewData, ReviewState};
pub use sm2::{Quality, ReviewOutcome, compute_next_review};
pub use stats::ReviewStats;
