//! Release search abstraction.
//!
//! This module provides the `ProviderQuery` trait implemented by site
//! adapters, and a `ProviderSet` that queries them all for one quality tier
//! and orders the combined results.

mod provider_set;
mod types;

pub use provider_set::{sort_results, ProviderSet};
pub use types::*;
