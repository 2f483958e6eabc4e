//! Release correctness filter.
//!
//! Checks run in a fixed order and stop at the first failure:
//! retention, required/ignored words, adult words, quality, 3D, size,
//! provider extra check, then title/year identity.

mod correctness;
mod types;
mod words;

pub use correctness::CorrectnessFilter;
pub use types::{FilterConfig, RejectionReason};
pub use words::{WordGroup, WordPatternError, WordRules};
