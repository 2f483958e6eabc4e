//! Fan-out over every configured provider.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::types::{CandidateRelease, ProviderQuery, SearchMethod};
use crate::media::WantedMedia;
use crate::metrics;
use crate::quality::QualityTier;

/// The providers a search may query.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: Vec<Arc<dyn ProviderQuery>>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderSet").field("providers", &names).finish()
    }
}

impl ProviderSet {
    pub fn new(providers: Vec<Arc<dyn ProviderQuery>>) -> Self {
        Self { providers }
    }

    pub fn push(&mut self, provider: Arc<dyn ProviderQuery>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Search methods covered by at least one provider.
    pub fn enabled_methods(&self) -> Vec<SearchMethod> {
        let mut methods = Vec::new();
        for provider in &self.providers {
            let method = provider.protocol().method();
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        methods
    }

    /// Query every provider whose protocol is in `methods` and return the
    /// combined, ordered results.
    ///
    /// Provider errors and panics are logged and count as zero results.
    pub async fn search(
        &self,
        media: &WantedMedia,
        tier: &QualityTier,
        methods: &[SearchMethod],
        preferred: SearchMethod,
    ) -> Vec<CandidateRelease> {
        let mut results = Vec::new();

        for provider in &self.providers {
            if !methods.contains(&provider.protocol().method()) {
                continue;
            }

            let outcome = AssertUnwindSafe(provider.query(media, tier))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(found)) => {
                    debug!(
                        "Provider {} returned {} results for {} in {}",
                        provider.name(),
                        found.len(),
                        media.display_name(),
                        tier.label
                    );
                    results.extend(found);
                }
                Ok(Err(e)) => {
                    warn!(
                        "Provider {} failed searching {}: {}",
                        provider.name(),
                        media.display_name(),
                        e
                    );
                    metrics::PROVIDER_FAILURES
                        .with_label_values(&[provider.name()])
                        .inc();
                }
                Err(_) => {
                    warn!(
                        "Provider {} panicked searching {}",
                        provider.name(),
                        media.display_name()
                    );
                    metrics::PROVIDER_FAILURES
                        .with_label_values(&[provider.name()])
                        .inc();
                }
            }
        }

        sort_results(&mut results, preferred);
        results
    }
}

/// Order by provider score, best first. With a preferred method, a stable
/// second pass moves that method's results ahead of the rest.
pub fn sort_results(results: &mut [CandidateRelease], preferred: SearchMethod) {
    results.sort_by(|a, b| b.provider_score.cmp(&a.provider_score));

    if preferred != SearchMethod::Both {
        results.sort_by_key(|r| r.protocol.method() != preferred);
    }
}
