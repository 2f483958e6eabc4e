//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the orchestrator's
//! collaborators, allowing end-to-end search tests without real providers
//! or download clients.
//!
//! # Example
//!
//! ```rust,ignore
//! use hunter_core::testing::{fixtures, MockDownloader, MockProvider};
//!
//! let provider = MockProvider::torrent();
//! let downloader = MockDownloader::new();
//!
//! // Configure mock responses
//! provider.set_results("720p", vec![fixtures::candidate("Movie.2010.720p", 4500)]).await;
//!
//! // Build a SearchOrchestrator with them...
//! ```

mod fixed_clock;
mod mock_downloader;
mod mock_provider;
mod mock_release_dates;

pub use fixed_clock::FixedClock;
pub use mock_downloader::{MockDownloader, RecordedDownload};
pub use mock_provider::{MockProvider, RecordedQuery};
pub use mock_release_dates::MockReleaseDates;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::media::WantedMedia;
    use crate::profile::Profile;
    use crate::searcher::{CandidateRelease, Protocol};

    /// Create a torrent candidate with reasonable defaults.
    pub fn candidate(name: &str, size_mb: u64) -> CandidateRelease {
        CandidateRelease::new(
            name,
            format!("http://tracker.test/{}.torrent", name),
            Protocol::Torrent,
            "mock-torrent",
        )
        .with_size(size_mb)
        .with_age(30)
        .with_peers(50, 10)
        .with_score(10)
    }

    /// Create a usenet candidate (no seeders).
    pub fn nzb_candidate(name: &str, size_mb: u64, age_days: u32) -> CandidateRelease {
        CandidateRelease::new(
            name,
            format!("http://indexer.test/getnzb/{}.nzb", name),
            Protocol::Nzb,
            "mock-nzb",
        )
        .with_size(size_mb)
        .with_age(age_days)
        .with_score(10)
    }

    /// Create an active wanted movie using the "default" profile.
    pub fn media(id: &str, title: &str, year: i32) -> WantedMedia {
        WantedMedia::new(id, title, Some(year))
            .with_identifier(format!("tt{:07}", 1_000_000 + title.len()))
            .with_profile("default")
    }

    /// Create a profile where every tier finishes and nothing waits.
    pub fn profile(id: &str, qualities: &[&str]) -> Profile {
        Profile::new(id, qualities)
    }
}
