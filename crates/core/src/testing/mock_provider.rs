//! Mock provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::WantedMedia;
use crate::quality::QualityTier;
use crate::searcher::{CandidateRelease, Protocol, ProviderError, ProviderQuery};

/// A recorded provider query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub media_id: String,
    pub tier: String,
}

/// Mock implementation of the ProviderQuery trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results per quality tier
/// - Track queries for assertions
/// - Simulate failures and panics
///
/// # Example
///
/// ```rust,ignore
/// use hunter_core::testing::{fixtures, MockProvider};
///
/// let provider = MockProvider::new("mock", Protocol::Torrent);
/// provider
///     .set_results("720p", vec![fixtures::candidate("Movie.Name.2010.720p.x264", 4500)])
///     .await;
///
/// let queries = provider.recorded_queries().await;
/// ```
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    protocol: Protocol,
    /// Results keyed by tier identifier.
    results: Arc<RwLock<HashMap<String, Vec<CandidateRelease>>>>,
    /// Results for tiers without an entry.
    default_results: Arc<RwLock<Vec<CandidateRelease>>>,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    /// If set, the next query will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// If set, every query panics.
    panic_on_query: Arc<AtomicBool>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .field("results", &"<results>")
            .field("queries", &"<queries>")
            .finish()
    }
}

impl MockProvider {
    pub fn new(name: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            protocol,
            results: Arc::new(RwLock::new(HashMap::new())),
            default_results: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic_on_query: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A torrent provider named "mock-torrent".
    pub fn torrent() -> Self {
        Self::new("mock-torrent", Protocol::Torrent)
    }

    /// A usenet provider named "mock-nzb".
    pub fn nzb() -> Self {
        Self::new("mock-nzb", Protocol::Nzb)
    }

    /// Set the results returned for one tier.
    pub async fn set_results(&self, tier: &str, results: Vec<CandidateRelease>) {
        self.results.write().await.insert(tier.to_string(), results);
    }

    /// Set the results returned for every tier without its own results.
    pub async fn set_default_results(&self, results: Vec<CandidateRelease>) {
        *self.default_results.write().await = results;
    }

    /// Get recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    /// Tier identifiers queried, in order.
    pub async fn queried_tiers(&self) -> Vec<String> {
        self.queries
            .read()
            .await
            .iter()
            .map(|q| q.tier.clone())
            .collect()
    }

    /// Make the next query fail.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every query panic.
    pub fn set_panic(&self, panic: bool) {
        self.panic_on_query.store(panic, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProviderQuery for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn query(
        &self,
        media: &WantedMedia,
        tier: &QualityTier,
    ) -> Result<Vec<CandidateRelease>, ProviderError> {
        self.queries.write().await.push(RecordedQuery {
            media_id: media.id.clone(),
            tier: tier.identifier.clone(),
        });

        if self.panic_on_query.load(Ordering::SeqCst) {
            panic!("mock provider {} panicked", self.name);
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(results) = self.results.read().await.get(&tier.identifier) {
            return Ok(results.clone());
        }
        Ok(self.default_results.read().await.clone())
    }
}
