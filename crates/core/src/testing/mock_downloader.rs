//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::WantedMedia;
use crate::orchestrator::{DownloadError, DownloadOutcome, Downloader};
use crate::searcher::{CandidateRelease, Protocol, SearchMethod};

/// A recorded download for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDownload {
    pub media_id: String,
    pub name: String,
    pub url: String,
    pub protocol: Protocol,
}

/// Mock implementation of the Downloader trait.
///
/// Snatches everything unless outcomes are queued with `push_outcome`.
#[derive(Clone)]
pub struct MockDownloader {
    protocols: Vec<SearchMethod>,
    outcomes: Arc<RwLock<VecDeque<Result<DownloadOutcome, DownloadError>>>>,
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
}

impl std::fmt::Debug for MockDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDownloader")
            .field("protocols", &self.protocols)
            .field("outcomes", &"<outcomes>")
            .field("downloads", &"<downloads>")
            .finish()
    }
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    /// A downloader accepting torrents and NZBs.
    pub fn new() -> Self {
        Self::with_protocols(vec![SearchMethod::Torrent, SearchMethod::Nzb])
    }

    pub fn with_protocols(protocols: Vec<SearchMethod>) -> Self {
        Self {
            protocols,
            outcomes: Arc::new(RwLock::new(VecDeque::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue the result of the next download.
    pub async fn push_outcome(&self, outcome: Result<DownloadOutcome, DownloadError>) {
        self.outcomes.write().await.push_back(outcome);
    }

    /// Get recorded downloads.
    pub async fn recorded_downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }

    /// Names of the candidates handed over, in order.
    pub async fn downloaded_names(&self) -> Vec<String> {
        self.downloads
            .read()
            .await
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn enabled_protocols(&self) -> Vec<SearchMethod> {
        self.protocols.clone()
    }

    async fn download(
        &self,
        candidate: &CandidateRelease,
        media: &WantedMedia,
    ) -> Result<DownloadOutcome, DownloadError> {
        self.downloads.write().await.push(RecordedDownload {
            media_id: media.id.clone(),
            name: candidate.name.clone(),
            url: candidate.url.clone(),
            protocol: candidate.protocol,
        });

        self.outcomes
            .write()
            .await
            .pop_front()
            .unwrap_or(Ok(DownloadOutcome::Snatched))
    }
}
