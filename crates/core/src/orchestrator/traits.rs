//! Download handoff.

use async_trait::async_trait;
use thiserror::Error;

use crate::media::WantedMedia;
use crate::searcher::{CandidateRelease, SearchMethod};

/// Errors from the download collaborator.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("Download client unavailable: {0}")]
    Unavailable(String),

    #[error("Download failed: {0}")]
    Failed(String),
}

/// What the downloader did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Handed off; the search for this item is over.
    Snatched,
    /// This candidate could not be used, try the next one.
    TryNext,
    /// Stop trying candidates for this tier.
    Rejected,
}

/// Hands accepted candidates to a torrent or usenet client.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Protocols the configured clients accept.
    fn enabled_protocols(&self) -> Vec<SearchMethod>;

    async fn download(
        &self,
        candidate: &CandidateRelease,
        media: &WantedMedia,
    ) -> Result<DownloadOutcome, DownloadError>;
}
