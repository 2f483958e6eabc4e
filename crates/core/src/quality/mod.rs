//! Quality catalog and guessing.
//!
//! The catalog is the ordered table of release qualities. The guesser scores
//! filenames against it to decide which tier a release belongs to.

mod cache;
mod catalog;
mod guesser;
mod types;

pub use cache::{signature, GuessCache};
pub use catalog::QualityCatalog;
pub use guesser::{tokenize, GuessHints, QualityGuesser};
pub use types::{
    QualityError, QualityGuess, QualityTier, ScoreTable, SizeOverride, TagMatcher, ThreeDFamily,
    TierScore,
};
