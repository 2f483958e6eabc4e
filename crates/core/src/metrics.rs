//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search orchestrator (media searches, tier searches, snatches)
//! - Correctness filter (rejections by reason)
//! - Providers and the quality guesser

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator
// =============================================================================

/// Media searches total by result.
pub static SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hunter_searches_total", "Total wanted media searches"),
        &["result"], // "snatched", "nothing_found", "skipped", "failed"
    )
    .unwrap()
});

/// Per-tier searches issued.
pub static TIER_SEARCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hunter_tier_searches_total",
        "Total provider searches issued for a single quality tier",
    )
    .unwrap()
});

/// Duration of a single media search.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hunter_search_duration_seconds",
            "Duration of a wanted media search",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Releases handed to the download collaborator and accepted.
pub static SNATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hunter_snatches_total", "Total releases snatched"),
        &["protocol"], // "torrent", "torrent_magnet", "nzb"
    )
    .unwrap()
});

// =============================================================================
// Filter
// =============================================================================

/// Candidates rejected by the correctness filter.
pub static CANDIDATES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hunter_candidates_rejected_total",
            "Total candidate releases rejected",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Providers and guesser
// =============================================================================

/// Provider queries that failed or panicked.
pub static PROVIDER_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hunter_provider_failures_total",
            "Total failed provider queries",
        ),
        &["provider"],
    )
    .unwrap()
});

/// Guess cache lookups.
pub static GUESS_CACHE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hunter_guess_cache_total", "Quality guess cache lookups"),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(SEARCHES.clone()),
        Box::new(TIER_SEARCHES.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SNATCHES.clone()),
        // Filter
        Box::new(CANDIDATES_REJECTED.clone()),
        // Providers and guesser
        Box::new(PROVIDER_FAILURES.clone()),
        Box::new(GUESS_CACHE.clone()),
    ]
}
