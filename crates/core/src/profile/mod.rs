//! Quality profiles.

mod types;

pub use types::*;
