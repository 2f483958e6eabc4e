//! Wanted media items and their known releases.

mod types;

pub use types::*;
