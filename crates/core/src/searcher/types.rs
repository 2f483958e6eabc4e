//! Types for the release search system.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::WantedMedia;
use crate::quality::QualityTier;

/// Transfer protocol of a candidate release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// A .torrent file url.
    Torrent,
    /// A magnet link.
    TorrentMagnet,
    /// A usenet NZB.
    Nzb,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Torrent => "torrent",
            Protocol::TorrentMagnet => "torrent_magnet",
            Protocol::Nzb => "nzb",
        }
    }

    /// The search method family this protocol belongs to.
    pub fn method(&self) -> SearchMethod {
        match self {
            Protocol::Torrent | Protocol::TorrentMagnet => SearchMethod::Torrent,
            Protocol::Nzb => SearchMethod::Nzb,
        }
    }
}

/// Preferred search method. `Both` applies no protocol bias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    #[default]
    Both,
    Torrent,
    Nzb,
}

/// Provider-attached validation run by the correctness filter.
pub type ExtraCheck = Arc<dyn Fn(&CandidateRelease) -> bool + Send + Sync>;

/// Provider-attached hook that fills in details (e.g. a description page)
/// before the extra check runs.
pub type MoreInfo = Arc<dyn Fn(&mut CandidateRelease) + Send + Sync>;

/// One result returned by a provider query, not yet validated.
#[derive(Clone)]
pub struct CandidateRelease {
    /// Provider-local id.
    pub id: String,
    pub name: String,
    pub url: String,
    /// Free text from the provider (nfo, description page).
    pub description: String,
    /// Size in MB, if reported.
    pub size_mb: Option<u64>,
    /// Age in days since the release was posted.
    pub age_days: u32,
    /// Seeder count. `None` for usenet results.
    pub seeders: Option<u32>,
    pub leechers: Option<u32>,
    pub protocol: Protocol,
    /// Name of the provider that returned it.
    pub provider: String,
    pub provider_score: i64,
    /// The provider searched by external identifier, so the title is known
    /// to be right.
    pub identifier_matched: bool,
    pub extra_check: Option<ExtraCheck>,
    pub more_info: Option<MoreInfo>,
}

impl fmt::Debug for CandidateRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateRelease")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("size_mb", &self.size_mb)
            .field("age_days", &self.age_days)
            .field("seeders", &self.seeders)
            .field("leechers", &self.leechers)
            .field("protocol", &self.protocol)
            .field("provider", &self.provider)
            .field("provider_score", &self.provider_score)
            .field("identifier_matched", &self.identifier_matched)
            .field("extra_check", &self.extra_check.as_ref().map(|_| "<fn>"))
            .field("more_info", &self.more_info.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl CandidateRelease {
    /// Create a candidate with no size, age, peers or score.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        protocol: Protocol,
        provider: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            id: url.clone(),
            name: name.into(),
            url,
            description: String::new(),
            size_mb: None,
            age_days: 0,
            seeders: None,
            leechers: None,
            protocol,
            provider: provider.into(),
            provider_score: 0,
            identifier_matched: false,
            extra_check: None,
            more_info: None,
        }
    }

    pub fn with_size(mut self, size_mb: u64) -> Self {
        self.size_mb = Some(size_mb);
        self
    }

    pub fn with_age(mut self, age_days: u32) -> Self {
        self.age_days = age_days;
        self
    }

    pub fn with_peers(mut self, seeders: u32, leechers: u32) -> Self {
        self.seeders = Some(seeders);
        self.leechers = Some(leechers);
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.provider_score = score;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_identifier_matched(mut self) -> Self {
        self.identifier_matched = true;
        self
    }

    pub fn with_extra_check(
        mut self,
        check: impl Fn(&CandidateRelease) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.extra_check = Some(Arc::new(check));
        self
    }

    pub fn with_more_info(
        mut self,
        more_info: impl Fn(&mut CandidateRelease) + Send + Sync + 'static,
    ) -> Self {
        self.more_info = Some(Arc::new(more_info));
        self
    }

    /// Usenet results carry no seeder count.
    pub fn is_usenet(&self) -> bool {
        self.seeders.is_none()
    }

    /// Stable release identifier: md5 of the url as lowercase hex.
    pub fn release_identifier(&self) -> String {
        release_identifier(&self.url)
    }
}

/// md5 of a release url as lowercase hex.
pub fn release_identifier(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Errors a provider may report. Never fatal to a search.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("Provider error: {0}")]
    Internal(String),
}

/// A search backend for one site or indexer.
#[async_trait]
pub trait ProviderQuery: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    /// Protocol of every result this provider returns.
    fn protocol(&self) -> Protocol;

    /// Search for releases of `media` in `tier`.
    async fn query(
        &self,
        media: &WantedMedia,
        tier: &QualityTier,
    ) -> Result<Vec<CandidateRelease>, ProviderError>;
}
