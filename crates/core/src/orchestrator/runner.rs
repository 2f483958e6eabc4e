//! Search orchestrator implementation.
//!
//! Walks a wanted item's profile tiers best to worst:
//! - gates each tier on release dates
//! - stops once an equal or better release is owned
//! - queries providers, filters candidates and hands the first usable one
//!   to the downloader

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SearcherConfig;
use crate::filter::CorrectnessFilter;
use crate::media::{KnownRelease, MediaStatus, ReleaseStatus, WantedMedia};
use crate::metrics;
use crate::profile::{Profile, ProfileEntry, QualityRank};
use crate::quality::{QualityCatalog, QualityTier};
use crate::searcher::{CandidateRelease, ProviderSet, SearchMethod};
use crate::store::{MediaStore, StoreError};

use super::config::OrchestratorConfig;
use super::eta::{could_be_released, NoReleaseDates, ReleaseDateLookup};
use super::traits::{DownloadOutcome, Downloader};
use super::types::{
    OrchestratorError, SearchProgress, SearchReport, SearchState, WantedItemSearchState,
};

/// Candidates smaller than this are never downloaded.
const MIN_DOWNLOAD_SIZE_MB: u64 = 50;

/// Result of handing a tier's accepted candidates to the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadAttempt {
    Snatched,
    Waiting,
    Nothing,
}

/// The search orchestrator - finds and snatches releases for wanted items.
pub struct SearchOrchestrator {
    config: OrchestratorConfig,
    searcher: SearcherConfig,
    catalog: Arc<QualityCatalog>,
    filter: Arc<CorrectnessFilter>,
    store: Arc<dyn MediaStore>,
    providers: ProviderSet,
    downloader: Arc<dyn Downloader>,
    release_dates: Arc<dyn ReleaseDateLookup>,
    clock: Arc<dyn Clock>,

    // Runtime state
    states: Arc<RwLock<HashMap<String, WantedItemSearchState>>>,
    progress: Arc<RwLock<Option<SearchProgress>>>,
    searching_all: Arc<AtomicBool>,
    shutting_down: Arc<AtomicBool>,
    owns_shutdown_flag: bool,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("config", &self.config)
            .field("searcher", &self.searcher)
            .field("providers", &self.providers)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SearchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        searcher: SearcherConfig,
        catalog: Arc<QualityCatalog>,
        filter: Arc<CorrectnessFilter>,
        store: Arc<dyn MediaStore>,
        providers: ProviderSet,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            searcher,
            catalog,
            filter,
            store,
            providers,
            downloader,
            release_dates: Arc::new(NoReleaseDates),
            clock: Arc::new(SystemClock),
            states: Arc::new(RwLock::new(HashMap::new())),
            progress: Arc::new(RwLock::new(None)),
            searching_all: Arc::new(AtomicBool::new(false)),
            shutting_down: Arc::new(AtomicBool::new(false)),
            owns_shutdown_flag: true,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn with_release_dates(mut self, release_dates: Arc<dyn ReleaseDateLookup>) -> Self {
        self.release_dates = release_dates;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share the host's "shutting down" flag. The host then owns resetting it.
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutting_down = flag;
        self.owns_shutdown_flag = false;
        self
    }

    /// Start the periodic search loop. Does nothing when the loop is disabled.
    pub async fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            info!("Periodic search disabled, searching on demand only");
            return;
        }

        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        if self.owns_shutdown_flag {
            self.shutting_down.store(false, Ordering::SeqCst);
        }

        info!("Starting search orchestrator");

        let this = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_secs(self.config.search_interval_secs);

        tokio::spawn(async move {
            info!("Search loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Search loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !this.running.load(Ordering::Relaxed) {
                            break;
                        }
                        this.search_all().await;
                    }
                }
            }
            info!("Search loop stopped");
        });
    }

    /// Stop the orchestrator, waiting up to the shutdown timeout for a running search.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping search orchestrator");

        self.shutting_down.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        let deadline = Instant::now() + Duration::from_secs(self.config.shutdown_timeout_secs);
        while self.is_busy().await {
            if Instant::now() >= deadline {
                warn!("Search still running after shutdown timeout");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        info!("Search orchestrator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }

    async fn is_busy(&self) -> bool {
        self.searching_all.load(Ordering::Relaxed)
            || self.states.read().await.values().any(|s| s.in_progress)
    }

    /// Progress of the running full search, if any.
    pub async fn progress(&self) -> Option<SearchProgress> {
        *self.progress.read().await
    }

    /// Search bookkeeping for one wanted item.
    pub async fn search_state(&self, media_id: &str) -> Option<WantedItemSearchState> {
        self.states.read().await.get(media_id).cloned()
    }

    /// Search every active item once.
    pub async fn search_all(&self) {
        if self.searching_all.swap(true, Ordering::SeqCst) {
            info!("Search already in progress");
            return;
        }

        match self.store.media_with_status(MediaStatus::Active) {
            Ok(items) => {
                info!("Searching for new releases ({} items)", items.len());
                *self.progress.write().await = Some(SearchProgress {
                    total: items.len(),
                    to_go: items.len(),
                });

                for media in items {
                    if self.is_shutting_down() {
                        break;
                    }

                    if let Err(e) = self.search_media(&media, false, false).await {
                        error!("Search failed for {}: {}", media.display_name(), e);
                    }

                    if let Some(progress) = self.progress.write().await.as_mut() {
                        progress.to_go = progress.to_go.saturating_sub(1);
                    }
                }
            }
            Err(e) => error!("Failed to list active media: {}", e),
        }

        *self.progress.write().await = None;
        self.searching_all.store(false, Ordering::SeqCst);
    }

    /// Search one item; true when a release was snatched.
    pub async fn single(&self, media: &WantedMedia, manual: bool, force_download: bool) -> bool {
        match self.search_media(media, manual, force_download).await {
            Ok(report) => report.snatched,
            Err(e) => {
                error!("Search failed for {}: {}", media.display_name(), e);
                false
            }
        }
    }

    /// Ignore the item's snatched and done releases, then search again.
    pub async fn try_next_release(
        &self,
        media_id: &str,
        manual: bool,
        force_download: bool,
    ) -> Result<bool, OrchestratorError> {
        for release in self.store.releases_for_media(media_id)? {
            if release.status.is_owned() {
                self.store
                    .update_release_status(&release.id, ReleaseStatus::Ignored)?;
            }
        }

        let media = self
            .store
            .get_media(media_id)?
            .ok_or_else(|| OrchestratorError::MediaNotFound(media_id.to_string()))?;

        info!("Trying next release for: {}", media.display_name());
        let report = self.search_media(&media, manual, force_download).await?;
        Ok(report.snatched)
    }

    /// Recompute whether an item is done from its releases.
    pub fn restatus(&self, media_id: &str) -> Result<MediaStatus, OrchestratorError> {
        let media = self
            .store
            .get_media(media_id)?
            .ok_or_else(|| OrchestratorError::MediaNotFound(media_id.to_string()))?;

        let profile = match &media.profile_id {
            Some(id) => self.store.get_profile(id)?,
            None => None,
        };

        let status = match profile {
            None => MediaStatus::Done,
            Some(profile) => {
                let now = self.clock.now();
                let finished = self.store.releases_for_media(media_id)?.iter().any(|r| {
                    r.status == ReleaseStatus::Done
                        && profile.is_finish(&r.quality, r.is_3d, r.days_since_edit(now))
                });
                if finished {
                    MediaStatus::Done
                } else {
                    MediaStatus::Active
                }
            }
        };

        if status != media.status {
            debug!("Changing status for {} to {}", media.display_name(), status.as_str());
            self.store.set_media_status(media_id, status)?;
        }
        Ok(status)
    }

    /// Search one item and report what happened.
    pub async fn search_media(
        &self,
        media: &WantedMedia,
        manual: bool,
        force_download: bool,
    ) -> Result<SearchReport, OrchestratorError> {
        let started = Instant::now();

        let protocols = self.search_protocols();
        if protocols.is_empty() {
            error!("No search protocols available, check provider and downloader settings");
            return Ok(SearchReport::skipped());
        }

        let profile = match &media.profile_id {
            Some(id) => self.store.get_profile(id)?,
            None => None,
        };
        let profile = match profile {
            Some(profile) if manual || media.status != MediaStatus::Done => profile,
            _ => {
                debug!(
                    "{} has no profile or is already done",
                    media.display_name()
                );
                self.restatus(&media.id)?;
                return Ok(SearchReport::skipped());
            }
        };
        profile.validate()?;

        let Some(title) = media.title() else {
            error!("No title found for {}, removing it", media.id);
            self.store.delete_media(&media.id)?;
            self.states.write().await.remove(&media.id);
            return Ok(SearchReport::skipped());
        };

        let now = self.clock.now();
        let ignore_eta = match self.begin(&media.id, manual, now).await {
            Some(ignore_eta) => ignore_eta,
            None => {
                info!("Already searching for {}", title);
                return Ok(SearchReport::skipped());
            }
        };

        let result = self
            .walk(media, title, &profile, &protocols, ignore_eta, force_download, now)
            .await;

        let final_state = match &result {
            Ok(report) if report.snatched => SearchState::Snatched,
            Ok(report) if report.waiting => SearchState::Waiting,
            _ => SearchState::Exhausted,
        };
        if let Some(state) = self.states.write().await.get_mut(&media.id) {
            state.in_progress = false;
            state.state = final_state;
        }

        let label = match &result {
            Ok(report) => report.result(),
            Err(_) => "failed",
        };
        metrics::SEARCHES.with_label_values(&[label]).inc();
        metrics::SEARCH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    /// Methods both a provider and the downloader support.
    fn search_protocols(&self) -> Vec<SearchMethod> {
        let accepted = self.downloader.enabled_protocols();
        self.providers
            .enabled_methods()
            .into_iter()
            .filter(|m| accepted.contains(m) || accepted.contains(&SearchMethod::Both))
            .collect()
    }

    /// Mark the item in progress; returns whether ETA is ignored this run,
    /// or None when it is already being searched.
    async fn begin(&self, media_id: &str, manual: bool, now: DateTime<Utc>) -> Option<bool> {
        let mut states = self.states.write().await;
        let state = states.entry(media_id.to_string()).or_default();
        if state.in_progress {
            return None;
        }

        state.in_progress = true;
        state.last_checked_at = Some(now);
        state.tier_index = 0;
        state.state = SearchState::Searching { tier_index: 0 };

        let mut ignore_eta = manual;
        if !self.searcher.always_search {
            let interval = chrono::Duration::days(i64::from(self.searcher.ignore_eta_interval_days));
            if state.last_ignored_eta_at.is_none_or(|t| t < now - interval) {
                ignore_eta = true;
                state.last_ignored_eta_at = Some(now);
            }
        }
        Some(ignore_eta)
    }

    async fn set_tier(&self, media_id: &str, tier_index: usize) {
        if let Some(state) = self.states.write().await.get_mut(media_id) {
            state.tier_index = tier_index;
            state.state = SearchState::Searching { tier_index };
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn walk(
        &self,
        media: &WantedMedia,
        title: &str,
        profile: &Profile,
        protocols: &[SearchMethod],
        ignore_eta: bool,
        force_download: bool,
        now: DateTime<Utc>,
    ) -> Result<SearchReport, OrchestratorError> {
        let mut report = SearchReport::default();
        let always_search = self.searcher.always_search;

        if self.restatus(&media.id)? == MediaStatus::Done {
            debug!("No better quality found, marking {} as done", title);
        }

        let dates = self.release_dates.release_dates(media).await;
        let mut previous = self.store.releases_for_media(&media.id)?;
        let mut found: HashSet<String> = HashSet::new();

        for entry in profile.entries() {
            if self.is_shutting_down() {
                break;
            }

            let Some(tier) = self.catalog.get(&entry.quality) else {
                warn!("Unknown quality {} in profile {}", entry.quality, profile.id);
                continue;
            };

            let releasable = could_be_released(
                self.catalog.is_pre_release(&tier.identifier),
                dates.as_ref(),
                media.year,
                now,
            );
            if !always_search && !releasable {
                report.too_early.push(tier.identifier.clone());
                if !ignore_eta {
                    continue;
                }
            }

            let owned = match self.store.releases_for_media(&media.id) {
                Ok(owned) => owned,
                Err(e) => {
                    error!(
                        "Failed to load releases for {}, skipping {}: {}",
                        title, tier.label, e
                    );
                    continue;
                }
            };
            let better = owned.iter().filter(|r| r.status.is_owned()).find(|r| {
                profile.compare(&entry.quality, entry.is_3d, &r.quality, r.is_3d)
                    != QualityRank::Higher
            });
            if let Some(better) = better {
                info!(
                    "Better quality ({}) already available or snatched for {}",
                    better.quality, title
                );
                if let Err(e) = self.restatus(&media.id) {
                    error!("Failed to update status for {}: {}", title, e);
                }
                break;
            }

            self.set_tier(&media.id, entry.index).await;
            metrics::TIER_SEARCHES.inc();
            info!(
                "Search for {} in {}{}",
                title,
                tier.label,
                if always_search || ignore_eta {
                    " ignoring ETA"
                } else {
                    ""
                }
            );

            let results = self
                .providers
                .search(media, tier, protocols, self.searcher.preferred_method)
                .await;

            match self.store.get_media(&media.id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!("{} was removed while searching", title);
                    self.states.write().await.remove(&media.id);
                    return Ok(report);
                }
                Err(e) => {
                    error!(
                        "Failed to reload {}, skipping {}: {}",
                        title, tier.label, e
                    );
                    continue;
                }
            }

            let accepted = self.accept_results(results, media, tier, &entry, now);
            if self.is_shutting_down() {
                info!("Shutting down, not downloading results for {}", title);
                break;
            }

            let count = accepted.len();
            report.total_results += count;
            found.extend(accepted.iter().map(|(_, r)| r.identifier.clone()));

            if count == 0 {
                debug!("Nothing found for {} in {}", title, tier.label);
            }
            if !releasable {
                report.found_before_eta += count;
                if count > 0 {
                    debug!(
                        "Found {} releases for \"{}\", but ETA isn't correct yet",
                        count, title
                    );
                }
            }

            if force_download || releasable || always_search {
                match self.try_download_result(accepted, media, &entry).await {
                    DownloadAttempt::Snatched => report.snatched = true,
                    DownloadAttempt::Waiting => report.waiting = true,
                    DownloadAttempt::Nothing => {}
                }
            }

            let mut kept = Vec::with_capacity(previous.len());
            for release in previous {
                if release.status == ReleaseStatus::Available
                    && !found.contains(&release.identifier)
                {
                    debug!("Removing release no longer found: {}", release.name);
                    match self.store.delete_release(&release.id) {
                        Ok(()) => continue,
                        Err(e) => error!("Failed to remove release {}: {}", release.name, e),
                    }
                }
                kept.push(release);
            }
            previous = kept;

            if report.snatched || report.waiting {
                break;
            }
        }

        if !report.too_early.is_empty() {
            info!(
                "Too early to search for {}, {}",
                report.too_early.join(", "),
                title
            );
            if report.found_before_eta > 0 {
                info!(
                    "Found {} releases for \"{}\" before ETA",
                    report.found_before_eta, title
                );
            }
        }

        if report.snatched {
            if let Err(e) = self.restatus(&media.id) {
                error!("Failed to update status for {}: {}", title, e);
            }
        }

        Ok(report)
    }

    /// Run the correctness filter and record every accepted candidate.
    fn accept_results(
        &self,
        results: Vec<CandidateRelease>,
        media: &WantedMedia,
        tier: &QualityTier,
        entry: &ProfileEntry,
        now: DateTime<Utc>,
    ) -> Vec<(CandidateRelease, KnownRelease)> {
        let mut accepted = Vec::new();
        for mut candidate in results {
            if self.is_shutting_down() {
                break;
            }
            if !self.filter.is_correct(&mut candidate, media, tier, entry) {
                continue;
            }
            match self.track_release(&candidate, media, tier, entry, now) {
                Ok(release) => accepted.push((candidate, release)),
                Err(e) => error!("Failed to save release {}: {}", candidate.name, e),
            }
        }
        accepted
    }

    /// Create or refresh the stored release for a candidate, keeping its status.
    fn track_release(
        &self,
        candidate: &CandidateRelease,
        media: &WantedMedia,
        tier: &QualityTier,
        entry: &ProfileEntry,
        now: DateTime<Utc>,
    ) -> Result<KnownRelease, StoreError> {
        let identifier = candidate.release_identifier();
        let existing = self.store.find_release(&media.id, &identifier)?;

        let release = KnownRelease {
            id: existing
                .as_ref()
                .map(|r| r.id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            media_id: media.id.clone(),
            identifier,
            quality: tier.identifier.clone(),
            is_3d: entry.is_3d,
            status: existing
                .as_ref()
                .map_or(ReleaseStatus::Available, |r| r.status),
            name: candidate.name.clone(),
            url: candidate.url.clone(),
            size_mb: candidate.size_mb,
            age_days: candidate.age_days,
            provider_score: candidate.provider_score,
            seeders: candidate.seeders,
            protocol: candidate.protocol,
            provider: candidate.provider.clone(),
            last_edit: existing.as_ref().map_or(now, |r| r.last_edit),
        };

        self.store.save_release(&release)?;
        Ok(release)
    }

    /// Hand accepted candidates to the downloader, best first.
    async fn try_download_result(
        &self,
        results: Vec<(CandidateRelease, KnownRelease)>,
        media: &WantedMedia,
        entry: &ProfileEntry,
    ) -> DownloadAttempt {
        let minimum_seeders = self.searcher.minimum_seeders;
        let mut let_through = false;
        let mut usable = Vec::with_capacity(results.len());

        for (candidate, release) in results {
            if release.status.is_blocked() {
                info!("Ignored: {}", candidate.name);
                continue;
            }
            if candidate.provider_score < entry.minimum_score {
                info!(
                    "Ignored, score \"{}\" too low, need at least \"{}\": {}",
                    candidate.provider_score, entry.minimum_score, candidate.name
                );
                continue;
            }
            if let Some(size) = candidate.size_mb {
                if size <= MIN_DOWNLOAD_SIZE_MB {
                    info!("Ignored, size \"{}MB\" too low: {}", size, candidate.name);
                    continue;
                }
            }
            if let Some(seeders) = candidate.seeders {
                if seeders < minimum_seeders {
                    info!(
                        "Ignored, not enough seeders, has {} needs {}: {}",
                        seeders, minimum_seeders, candidate.name
                    );
                    continue;
                }
            }

            // one release old enough lets every other one through
            let wait = entry.index != 0 && entry.wait_for > 0 && candidate.age_days <= entry.wait_for;
            if !wait {
                let_through = true;
            }
            usable.push((candidate, release, wait));
        }

        let mut waiting = false;
        for (candidate, release, wait) in usable {
            if self.is_shutting_down() {
                info!("Shutting down, not downloading {}", candidate.name);
                break;
            }
            if wait && !let_through {
                info!(
                    "Ignored, waiting {} days: {}",
                    entry.wait_for - candidate.age_days,
                    candidate.name
                );
                waiting = true;
                continue;
            }

            match self.downloader.download(&candidate, media).await {
                Ok(DownloadOutcome::Snatched) => {
                    if let Err(e) = self
                        .store
                        .update_release_status(&release.id, ReleaseStatus::Snatched)
                    {
                        error!("Failed to mark {} as snatched: {}", candidate.name, e);
                    }
                    metrics::SNATCHES
                        .with_label_values(&[candidate.protocol.as_str()])
                        .inc();
                    info!(
                        "Snatched \"{}\" for {}",
                        candidate.name,
                        media.display_name()
                    );
                    return DownloadAttempt::Snatched;
                }
                Ok(DownloadOutcome::TryNext) => {
                    debug!("Downloader passed on {}, trying next", candidate.name);
                }
                Ok(DownloadOutcome::Rejected) => break,
                Err(e) => {
                    warn!("Failed to download {}: {}", candidate.name, e);
                    break;
                }
            }
        }

        if waiting {
            DownloadAttempt::Waiting
        } else {
            DownloadAttempt::Nothing
        }
    }
}
