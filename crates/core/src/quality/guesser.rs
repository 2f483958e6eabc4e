//! Quality guessing from release names, sizes and resolution hints.
//!
//! Every tier is scored against the tokens of every filename; sizes and
//! resolutions add weaker evidence. The highest positive total wins, ties go
//! to the better tier.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::cache::{signature, GuessCache};
use super::catalog::QualityCatalog;
use super::types::{QualityGuess, QualityTier, ScoreTable, TagMatcher, ThreeDFamily};
use crate::metrics;

const IDENTIFIER_POINTS: f64 = 25.0;
const LABEL_POINTS: f64 = 25.0;
const ALTERNATIVE_POINTS: f64 = 20.0;
const TAG_POINTS: f64 = 11.0;
const EXTENSION_POINTS: f64 = 5.0;

const SIZE_MAX_POINTS: f64 = 8.0;
const SIZE_OUT_OF_RANGE_PENALTY: f64 = 5.0;
const SINGLE_SIZE_MATCH_BONUS: f64 = 7.0;

const RESOLUTION_TOLERANCE: u32 = 20;
const WIDTH_POINTS: f64 = 10.0;
const HEIGHT_POINTS: f64 = 5.0;

/// Optional metadata that sharpens a guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuessHints {
    /// Size in MB. Zero counts as unknown.
    pub size_mb: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl GuessHints {
    pub fn size(size_mb: u64) -> Self {
        Self {
            size_mb: Some(size_mb),
            ..Default::default()
        }
    }

    fn size_mb(&self) -> Option<u64> {
        self.size_mb.filter(|s| *s > 0)
    }

    fn is_empty(&self) -> bool {
        self.size_mb().is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// Infers a quality tier from filenames.
#[derive(Debug, Clone)]
pub struct QualityGuesser {
    catalog: Arc<QualityCatalog>,
    cache: Arc<GuessCache>,
}

impl QualityGuesser {
    pub fn new(catalog: Arc<QualityCatalog>) -> Self {
        Self::with_cache(catalog, Arc::new(GuessCache::new()))
    }

    /// Share a cache between guessers (or give each test a fresh one).
    pub fn with_cache(catalog: Arc<QualityCatalog>, cache: Arc<GuessCache>) -> Self {
        Self { catalog, cache }
    }

    pub fn catalog(&self) -> &Arc<QualityCatalog> {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<GuessCache> {
        &self.cache
    }

    /// Best matching tier, or `None` without confident evidence.
    ///
    /// Results are memoized only for calls without hints, since a size or
    /// resolution can change the outcome.
    pub fn guess(&self, files: &[String], hints: GuessHints) -> Option<QualityGuess> {
        let cache_key = hints.is_empty().then(|| signature(files));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                metrics::GUESS_CACHE.with_label_values(&["hit"]).inc();
                return Some(cached);
            }
            metrics::GUESS_CACHE.with_label_values(&["miss"]).inc();
        }

        debug!("Trying to guess quality of: {:?}", files);

        let table = self.score(files, hints);
        let winner = table.winner()?;
        let tier = self.catalog.get(&winner.identifier)?.clone();
        let guess = QualityGuess {
            is_3d: !winner.threed.is_empty(),
            tier,
        };

        if let Some(key) = cache_key {
            self.cache.insert(key, guess.clone());
        }
        Some(guess)
    }

    /// Full score table for the given files.
    pub fn score(&self, files: &[String], hints: GuessHints) -> ScoreTable {
        let tiers = self.catalog.all();
        let mut table = ScoreTable::new(tiers);

        for file in files {
            let words = tokenize(file);
            if words.is_empty() {
                continue;
            }

            for tier in tiers {
                let contains_score = contains_tag_score(tier, &words, file);
                let threed = if tier.allows_3d {
                    contains_3d(&words, file)
                } else {
                    None
                };
                self.calc_score(&mut table, tier, contains_score, threed, contains_score);
            }
        }

        let mut size_matches = Vec::new();
        for tier in tiers {
            let size_score = size_score(tier, hints.size_mb());
            let loose_score = loose_score(tier, hints.width, hints.height);

            if size_score > 0.0 {
                size_matches.push(tier);
            }
            self.calc_score(&mut table, tier, size_score + loose_score, None, 0.0);
        }

        if let [only] = size_matches.as_slice() {
            self.calc_score(&mut table, only, SINGLE_SIZE_MATCH_BONUS, None, 0.0);
        }

        table
    }

    /// Add a score to a tier and, when `penalty` is set, push down the tiers
    /// it may substitute for plus every other tier.
    fn calc_score(
        &self,
        table: &mut ScoreTable,
        tier: &QualityTier,
        add_score: f64,
        threed: Option<ThreeDFamily>,
        penalty: f64,
    ) {
        if let Some(entry) = table.entry_mut(tier.order) {
            entry.score += add_score;
            if let Some(family) = threed {
                *entry.threed.entry(family).or_insert(0.0) += 1.0;
            }
        }

        if penalty == 0.0 || add_score == 0.0 {
            return;
        }

        for allow in &tier.allow {
            let Some(allow_order) = self.catalog.order_index_of(allow) else {
                continue;
            };
            let base = if allow_order < tier.order {
                penalty * 2.0
            } else {
                penalty
            };
            if let Some(entry) = table.entry_mut(allow_order) {
                entry.score -= base * 2.0;
            }
        }

        for other in self.catalog.all() {
            if other.order == tier.order {
                continue;
            }
            if let Some(entry) = table.entry_mut(other.order) {
                entry.score -= 1.0;
            }
        }
    }
}

/// Lower-cased word tokens, split on anything that is not a word character.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tag evidence for one tier in one filename. The last token is the
/// extension candidate and is not matched against the vocabulary.
fn contains_tag_score(tier: &QualityTier, words: &[String], file: &str) -> f64 {
    let Some((extension, body)) = words.split_last() else {
        return 0.0;
    };
    let body: HashSet<&str> = body.iter().map(String::as_str).collect();

    let identifier = [TagMatcher::Word(tier.identifier.clone())];
    let label = [TagMatcher::Word(tier.label.to_lowercase())];
    let groups: [(&str, &[TagMatcher], f64); 4] = [
        ("identifier", &identifier, IDENTIFIER_POINTS),
        ("alternative", &tier.alternative, ALTERNATIVE_POINTS),
        ("tags", &tier.tags, TAG_POINTS),
        ("label", &label, LABEL_POINTS),
    ];

    let mut score = 0.0;
    let mut scored_on: HashSet<&str> = HashSet::new();

    for (kind, entries, points) in groups {
        for entry in entries {
            match entry {
                TagMatcher::AllOf(_) => {
                    if entry.matches(&body) {
                        debug!("Found {} via {} {:?} in {}", tier.identifier, kind, entry, file);
                        score += points;
                    }
                }
                TagMatcher::Word(word) => {
                    if body.contains(word.as_str()) && !scored_on.contains(word.as_str()) {
                        debug!("Found {} via {} {} in {}", tier.identifier, kind, word, file);
                        score += points;
                        scored_on.insert(word.as_str());
                    }
                }
            }
        }
    }

    for ext in &tier.extensions {
        if ext == extension {
            debug!("Found {} with .{} extension in {}", tier.identifier, ext, file);
            score += EXTENSION_POINTS;
        }
    }

    score
}

/// First 3D family whose vocabulary appears in the tokens.
fn contains_3d(words: &[String], file: &str) -> Option<ThreeDFamily> {
    let set: HashSet<&str> = words.iter().map(String::as_str).collect();
    for family in ThreeDFamily::ALL {
        if let Some(tag) = family.vocabulary().iter().find(|t| t.matches(&set)) {
            debug!("Found 3D tag {:?} in {}", tag, file);
            return Some(family);
        }
    }
    None
}

/// Size evidence: in range scores up to 8 points by closeness to the median,
/// out of range costs 5.
pub(crate) fn size_score(tier: &QualityTier, size_mb: Option<u64>) -> f64 {
    let Some(size) = size_mb else {
        return 0.0;
    };

    if !tier.size_in_range(size) {
        return -SIZE_OUT_OF_RANGE_PENALTY;
    }

    debug!(
        "Found {} via release size: {} MB <= {} MB <= {} MB",
        tier.identifier, tier.size_min, size, tier.size_max
    );

    let range = (tier.size_max - tier.size_min) as f64;
    if range == 0.0 {
        return SIZE_MAX_POINTS;
    }
    let size_proc = (size - tier.size_min) as f64 / range;
    let median_proc = (tier.median_size.saturating_sub(tier.size_min)) as f64 / range;

    (SIZE_MAX_POINTS - (size_proc - median_proc).abs() * SIZE_MAX_POINTS).ceil()
}

/// Resolution evidence from explicit width/height hints.
pub(crate) fn loose_score(tier: &QualityTier, width: Option<u32>, height: Option<u32>) -> f64 {
    let mut score = 0.0;

    if let (Some(expected), Some(actual)) = (tier.width, width) {
        if actual.abs_diff(expected) <= RESOLUTION_TOLERANCE {
            debug!("Found {} via width: {} ~ {}", tier.identifier, expected, actual);
            score += WIDTH_POINTS;
        }
    }

    if let (Some(expected), Some(actual)) = (tier.height, height) {
        if actual.abs_diff(expected) <= RESOLUTION_TOLERANCE {
            debug!("Found {} via height: {} ~ {}", tier.identifier, expected, actual);
            score += HEIGHT_POINTS;
        }
    }

    if tier.identifier == "dvdrip" && width.is_some_and(|w| (480..=720).contains(&w)) {
        score += 1.0;
    }

    score
}
