//! The ordered chain of acceptance checks for one candidate release.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, info, warn};

use super::types::{FilterConfig, RejectionReason};
use super::words::{WordPatternError, WordRules};
use crate::clock::Clock;
use crate::matcher::{
    correct_name, correct_year, extract_imdb, possible_titles, simplified_words, simplify,
    TitleMatcher,
};
use crate::media::WantedMedia;
use crate::metrics;
use crate::profile::ProfileEntry;
use crate::quality::{GuessHints, QualityGuesser, QualityTier, TagMatcher};
use crate::searcher::CandidateRelease;

const ADULT_WORDS: &[&str] = &[
    "xxx", "sex", "anal", "tits", "fuck", "porn", "orgy", "milf", "boobs", "erotica", "erotic",
    "cock", "dick",
];

/// Media older than this many years may lack quality tags in names.
const UNTAGGED_MEDIA_AGE_YEARS: i32 = 3;

/// Decides whether a candidate is the wanted media in the wanted tier.
pub struct CorrectnessFilter {
    config: FilterConfig,
    required: WordRules,
    ignored: WordRules,
    guesser: Arc<QualityGuesser>,
    matcher: Arc<dyn TitleMatcher>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CorrectnessFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectnessFilter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CorrectnessFilter {
    /// Fails when a configured `/pattern/` word group does not compile.
    pub fn new(
        config: FilterConfig,
        guesser: Arc<QualityGuesser>,
        matcher: Arc<dyn TitleMatcher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WordPatternError> {
        let required = WordRules::parse(&config.required_words)?;
        let ignored = WordRules::parse(&config.ignored_words)?;

        Ok(Self {
            config,
            required,
            ignored,
            guesser,
            matcher,
            clock,
        })
    }

    pub fn guesser(&self) -> &Arc<QualityGuesser> {
        &self.guesser
    }

    /// Accept or reject, logging the reason for a rejection.
    pub fn is_correct(
        &self,
        candidate: &mut CandidateRelease,
        media: &WantedMedia,
        tier: &QualityTier,
        entry: &ProfileEntry,
    ) -> bool {
        match self.check(candidate, media, tier, entry) {
            Ok(()) => true,
            Err(reason) => {
                info!("Wrong: {}, {}", candidate.name, reason);
                metrics::CANDIDATES_REJECTED
                    .with_label_values(&[reason.kind()])
                    .inc();
                false
            }
        }
    }

    /// Run every check in order and report the first failure.
    ///
    /// May call the candidate's `more_info` hook, which can update it.
    pub fn check(
        &self,
        candidate: &mut CandidateRelease,
        media: &WantedMedia,
        tier: &QualityTier,
        entry: &ProfileEntry,
    ) -> Result<(), RejectionReason> {
        self.check_retention(candidate)?;

        let name = simplify(&candidate.name);
        let words: HashSet<&str> = name.split(' ').filter(|w| !w.is_empty()).collect();

        self.check_words(&name, &words, media)?;
        check_adult(&words, media)?;
        self.check_quality(candidate, &words, media, tier)?;
        self.check_3d(candidate, entry)?;
        check_size(candidate, tier)?;
        check_extra(candidate)?;
        self.check_identity(candidate, media)
    }

    fn check_retention(&self, candidate: &CandidateRelease) -> Result<(), RejectionReason> {
        let retention = self.config.retention_days;
        if candidate.is_usenet() && retention > 0 && candidate.age_days > retention {
            return Err(RejectionReason::TooOld {
                age_days: candidate.age_days,
                retention_days: retention,
            });
        }
        Ok(())
    }

    fn check_words(
        &self,
        name: &str,
        words: &HashSet<&str>,
        media: &WantedMedia,
    ) -> Result<(), RejectionReason> {
        let category = media.category.as_ref();

        let required = merged_rules(&self.required, category.map(|c| c.required_words.as_str()));
        if !required.is_empty() && required.first_match(name, words).is_none() {
            return Err(RejectionReason::MissingRequiredWords);
        }

        let ignored = merged_rules(&self.ignored, category.map(|c| c.ignored_words.as_str()));
        if let Some(group) = ignored.first_match(name, words) {
            return Err(RejectionReason::ContainsIgnoredWords {
                group: group.source().to_string(),
            });
        }

        Ok(())
    }

    fn check_quality(
        &self,
        candidate: &CandidateRelease,
        words: &HashSet<&str>,
        media: &WantedMedia,
        tier: &QualityTier,
    ) -> Result<(), RejectionReason> {
        let catalog = self.guesser.catalog();
        let mut found: Vec<String> = Vec::new();

        for other in catalog.all() {
            let named = words.contains(other.identifier.as_str());
            let alternative = other.alternative.iter().any(|alt| match alt {
                TagMatcher::Word(w) => words.contains(w.as_str()),
                TagMatcher::AllOf(_) => false,
            });
            if named || alternative {
                add_found(&mut found, &other.identifier);
            }
        }

        if let Some(guess) = self.guesser.guess(
            &[candidate.name.clone()],
            GuessHints {
                size_mb: candidate.size_mb,
                ..Default::default()
            },
        ) {
            add_found(&mut found, guess.identifier());
        }

        if found.is_empty() && self.is_old_untagged(candidate, media) {
            let size = candidate.size_mb.unwrap_or(0);
            let assumed = if size > 20000 {
                "bd50"
            } else if size > 3000 {
                "dvdr"
            } else {
                "dvdrip"
            };
            info!(
                "Quality was missing in name, assuming {} based on the size: {} MB",
                assumed, size
            );
            add_found(&mut found, assumed);
        }

        found.retain(|f| !tier.allow.contains(f));

        if found.len() == 1 && found[0] == tier.identifier {
            return Ok(());
        }

        Err(RejectionReason::WrongQuality {
            wanted: tier.label.clone(),
            found: if found.is_empty() {
                "no quality".to_string()
            } else {
                found.join(", ")
            },
        })
    }

    /// Media older than a few years whose release name carries no year.
    fn is_old_untagged(&self, candidate: &CandidateRelease, media: &WantedMedia) -> bool {
        let this_year = self.clock.now().year();
        let old = media
            .year
            .is_some_and(|y| y < this_year - UNTAGGED_MEDIA_AGE_YEARS);
        old && self.matcher.canonicalize(&candidate.name).year.is_none()
    }

    fn check_3d(
        &self,
        candidate: &CandidateRelease,
        entry: &ProfileEntry,
    ) -> Result<(), RejectionReason> {
        let found_3d = self
            .guesser
            .guess(&[candidate.name.clone()], GuessHints::default())
            .map(|g| g.is_3d)
            .unwrap_or(false);

        if found_3d != entry.is_3d {
            return Err(RejectionReason::Wrong3D {
                wanted_3d: entry.is_3d,
                found_3d,
            });
        }
        Ok(())
    }

    fn check_identity(
        &self,
        candidate: &CandidateRelease,
        media: &WantedMedia,
    ) -> Result<(), RejectionReason> {
        if candidate.identifier_matched {
            return Ok(());
        }

        if let Some(identifier) = &media.identifier {
            if extract_imdb(&candidate.description).as_deref() == Some(identifier.as_str()) {
                debug!("Found {} in description of {}", identifier, candidate.name);
                return Ok(());
            }
        }

        if let Some(year) = media.year {
            for raw_title in &media.titles {
                for title in possible_titles(raw_title) {
                    if !correct_name(self.matcher.as_ref(), &candidate.name, &title) {
                        continue;
                    }

                    // Short titles are ambiguous, so they need the exact year.
                    let range = if simplified_words(&title).len() > 2 { 1 } else { 0 };
                    if correct_year(self.matcher.as_ref(), &candidate.name, year, range) {
                        return Ok(());
                    }
                }
            }
        }

        Err(RejectionReason::TitleYearMismatch {
            expected: media.display_name(),
        })
    }
}

fn merged_rules(global: &WordRules, category: Option<&str>) -> WordRules {
    let mut rules = global.clone();
    if let Some(extra) = category.filter(|c| !c.trim().is_empty()) {
        if let Err(e) = rules.extend(extra) {
            warn!("Ignoring category words: {}", e);
        }
    }
    rules
}

fn add_found(found: &mut Vec<String>, identifier: &str) {
    if !found.iter().any(|f| f == identifier) {
        found.push(identifier.to_string());
    }
}

fn check_adult(words: &HashSet<&str>, media: &WantedMedia) -> Result<(), RejectionReason> {
    let title_words: HashSet<String> = media
        .title()
        .map(simplified_words)
        .unwrap_or_default()
        .into_iter()
        .collect();

    let hits: Vec<&str> = ADULT_WORDS
        .iter()
        .copied()
        .filter(|w| words.contains(w) && !title_words.contains(*w))
        .collect();

    if hits.is_empty() {
        Ok(())
    } else {
        Err(RejectionReason::AdultContent {
            words: hits.join(", "),
        })
    }
}

fn check_size(candidate: &CandidateRelease, tier: &QualityTier) -> Result<(), RejectionReason> {
    match candidate.size_mb {
        Some(size) if !tier.size_in_range(size) => Err(RejectionReason::SizeOutOfBounds {
            size_mb: size,
            size_min: tier.size_min,
            size_max: tier.size_max,
        }),
        _ => Ok(()),
    }
}

fn check_extra(candidate: &mut CandidateRelease) -> Result<(), RejectionReason> {
    if let Some(more_info) = candidate.more_info.clone() {
        more_info(candidate);
    }

    if let Some(extra_check) = candidate.extra_check.clone() {
        if !extra_check(candidate) {
            return Err(RejectionReason::ExtraCheckFailed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::SceneTitleMatcher;
    use crate::media::Category;
    use crate::profile::Profile;
    use crate::quality::QualityCatalog;
    use crate::searcher::Protocol;
    use crate::testing::FixedClock;

    fn filter_with(config: FilterConfig) -> CorrectnessFilter {
        let catalog = Arc::new(QualityCatalog::builtin().unwrap());
        CorrectnessFilter::new(
            config,
            Arc::new(QualityGuesser::new(catalog)),
            Arc::new(SceneTitleMatcher::new()),
            Arc::new(FixedClock::at_ymd(2026, 10, 14)),
        )
        .unwrap()
    }

    fn filter() -> CorrectnessFilter {
        filter_with(FilterConfig::default())
    }

    fn tier(identifier: &str) -> QualityTier {
        QualityCatalog::builtin()
            .unwrap()
            .get(identifier)
            .unwrap()
            .clone()
    }

    fn entry(identifier: &str) -> ProfileEntry {
        Profile::new("p", &[identifier]).entry(0).unwrap()
    }

    fn entry_3d(identifier: &str) -> ProfileEntry {
        let mut profile = Profile::new("p", &[identifier]);
        profile.three_d = vec![true];
        profile.entry(0).unwrap()
    }

    fn torrent(name: &str, size_mb: u64) -> CandidateRelease {
        CandidateRelease::new(name, format!("http://t/{}", name), Protocol::Torrent, "test")
            .with_size(size_mb)
            .with_peers(10, 1)
    }

    fn media() -> WantedMedia {
        WantedMedia::new("m1", "Movie Name", Some(2010))
    }

    fn check(
        f: &CorrectnessFilter,
        mut candidate: CandidateRelease,
        media: &WantedMedia,
        identifier: &str,
    ) -> Result<(), RejectionReason> {
        f.check(&mut candidate, media, &tier(identifier), &entry(identifier))
    }

    #[test]
    fn test_accepts_matching_release() {
        let result = check(
            &filter(),
            torrent("Movie.Name.2010.720p.BluRay.x264-Group", 5500),
            &media(),
            "720p",
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_usenet_outside_retention() {
        let f = filter_with(FilterConfig {
            retention_days: 1500,
            ..Default::default()
        });
        let nzb = CandidateRelease::new(
            "Movie.Name.2010.720p.BluRay.x264-Group",
            "http://n/1",
            Protocol::Nzb,
            "test",
        )
        .with_size(5500)
        .with_age(2000);
        assert_eq!(
            check(&f, nzb, &media(), "720p"),
            Err(RejectionReason::TooOld {
                age_days: 2000,
                retention_days: 1500
            })
        );

        // torrents have no retention
        let old_torrent = torrent("Movie.Name.2010.720p.BluRay.x264-Group", 5500).with_age(2000);
        assert_eq!(check(&f, old_torrent, &media(), "720p"), Ok(()));
    }

    #[test]
    fn test_required_words_missing() {
        let f = filter_with(FilterConfig {
            required_words: "x264, /\\bhevc\\b/".into(),
            ..Default::default()
        });
        assert_eq!(
            check(&f, torrent("Movie.Name.2010.720p.BluRay-Group", 5500), &media(), "720p"),
            Err(RejectionReason::MissingRequiredWords)
        );
        assert_eq!(
            check(&f, torrent("Movie.Name.2010.720p.BluRay.HEVC-Group", 5500), &media(), "720p"),
            Ok(())
        );
    }

    #[test]
    fn test_ignored_words() {
        let f = filter_with(FilterConfig {
            ignored_words: "german, dubbed".into(),
            ..Default::default()
        });
        assert_eq!(
            check(
                &f,
                torrent("Movie.Name.2010.German.720p.BluRay.x264-Group", 5500),
                &media(),
                "720p"
            ),
            Err(RejectionReason::ContainsIgnoredWords {
                group: "german".into()
            })
        );
    }

    #[test]
    fn test_category_ignored_words() {
        let media = media().with_category(Category {
            required_words: String::new(),
            ignored_words: "hc & subs".into(),
        });
        assert!(matches!(
            check(
                &filter(),
                torrent("Movie.Name.2010.720p.HC.Subs.x264-Group", 5500),
                &media,
                "720p"
            ),
            Err(RejectionReason::ContainsIgnoredWords { .. })
        ));
    }

    #[test]
    fn test_adult_words_unless_in_title() {
        assert!(matches!(
            check(
                &filter(),
                torrent("Movie.Name.2010.XXX.720p.BluRay.x264-Group", 5500),
                &media(),
                "720p"
            ),
            Err(RejectionReason::AdultContent { .. })
        ));

        let titled = WantedMedia::new("m2", "xXx", Some(2002));
        assert_eq!(
            check(&filter(), torrent("xXx.2002.720p.BluRay.x264-Group", 5500), &titled, "720p"),
            Ok(())
        );
    }

    #[test]
    fn test_wrong_quality() {
        let result = check(
            &filter(),
            torrent("Movie.Name.2010.1080p.BluRay.x264-Group", 8000),
            &media(),
            "720p",
        );
        assert!(matches!(
            result,
            Err(RejectionReason::WrongQuality { ref found, .. }) if found == "1080p"
        ));
    }

    #[test]
    fn test_allowed_substitute_is_not_wrong_quality() {
        let result = check(
            &filter(),
            torrent("Movie.Name.2010.BRRip.720p.x264-Group", 1500),
            &media(),
            "brrip",
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_found_qualities_are_unique() {
        let mut found = Vec::new();
        add_found(&mut found, "720p");
        add_found(&mut found, "1080p");
        add_found(&mut found, "720p");
        assert_eq!(found, vec!["720p", "1080p"]);
    }

    #[test]
    fn test_untagged_old_media_falls_back_to_size() {
        let old = WantedMedia::new("m3", "Movie Name", Some(2000)).with_identifier("tt0133093");
        let untagged = || {
            CandidateRelease::new("Movie Name", "http://n/2", Protocol::Nzb, "test")
                .with_description("http://www.imdb.com/title/tt0133093/")
        };

        assert_eq!(check(&filter(), untagged(), &old, "dvdrip"), Ok(()));
        assert!(matches!(
            check(&filter(), untagged(), &old, "dvdr"),
            Err(RejectionReason::WrongQuality { ref found, .. }) if found == "dvdrip"
        ));

        // recent media gets no benefit of the doubt
        let recent = WantedMedia::new("m4", "Movie Name", Some(2025)).with_identifier("tt0133093");
        assert!(matches!(
            check(&filter(), untagged(), &recent, "dvdrip"),
            Err(RejectionReason::WrongQuality { ref found, .. }) if found == "no quality"
        ));
    }

    #[test]
    fn test_3d_mismatch() {
        let f = filter();
        let mut flat = torrent("Movie.Name.2010.720p.BluRay.x264-Group", 5500);
        assert_eq!(
            f.check(&mut flat, &media(), &tier("720p"), &entry_3d("720p")),
            Err(RejectionReason::Wrong3D {
                wanted_3d: true,
                found_3d: false
            })
        );

        assert_eq!(
            check(
                &f,
                torrent("Movie.Name.2010.1080p.3D.HSBS.BluRay.x264-Group", 8000),
                &media(),
                "1080p"
            ),
            Err(RejectionReason::Wrong3D {
                wanted_3d: false,
                found_3d: true
            })
        );
    }

    #[test]
    fn test_size_out_of_bounds() {
        let result = check(
            &filter(),
            torrent("Movie.Name.2010.DVDRip.XviD-Group", 50),
            &media(),
            "dvdrip",
        );
        assert_eq!(
            result,
            Err(RejectionReason::SizeOutOfBounds {
                size_mb: 50,
                size_min: 600,
                size_max: 2400
            })
        );
    }

    #[test]
    fn test_first_failing_check_is_reported() {
        // wrong size and wrong title, size comes first
        let result = check(
            &filter(),
            torrent("Other.Film.1990.DVDRip.XviD-Group", 50),
            &media(),
            "dvdrip",
        );
        assert!(matches!(result, Err(RejectionReason::SizeOutOfBounds { .. })));
    }

    #[test]
    fn test_extra_check() {
        let failing = torrent("Movie.Name.2010.720p.BluRay.x264-Group", 5500).with_extra_check(|_| false);
        assert_eq!(
            check(&filter(), failing, &media(), "720p"),
            Err(RejectionReason::ExtraCheckFailed)
        );

        let enriched = torrent("Movie.Name.2010.720p.BluRay.x264-Group", 5500)
            .with_more_info(|c| c.description = "verified".into())
            .with_extra_check(|c| c.description == "verified");
        assert_eq!(check(&filter(), enriched, &media(), "720p"), Ok(()));
    }

    #[test]
    fn test_long_title_allows_one_year_off() {
        let media = WantedMedia::new("m5", "The Movie Name", Some(2014));
        assert_eq!(
            check(&filter(), torrent("The.Movie.Name.2015.720p.BluRay.x264-Group", 5500), &media, "720p"),
            Ok(())
        );
        assert!(matches!(
            check(&filter(), torrent("The.Movie.Name.2016.720p.BluRay.x264-Group", 5500), &media, "720p"),
            Err(RejectionReason::TitleYearMismatch { .. })
        ));
    }

    #[test]
    fn test_short_title_needs_exact_year() {
        let media = WantedMedia::new("m6", "Movie Name", Some(2014));
        assert!(matches!(
            check(&filter(), torrent("Movie.Name.2015.720p.BluRay.x264-Group", 5500), &media, "720p"),
            Err(RejectionReason::TitleYearMismatch { .. })
        ));
        assert_eq!(
            check(&filter(), torrent("Movie.Name.2014.720p.BluRay.x264-Group", 5500), &media, "720p"),
            Ok(())
        );
    }

    #[test]
    fn test_alternate_title_and_identifier_match() {
        let media = media().with_alternate_title("Le Film");
        assert_eq!(
            check(&filter(), torrent("Le.Film.2010.720p.BluRay.x264-Group", 5500), &media, "720p"),
            Ok(())
        );

        let by_id = torrent("Totally.Different.720p.BluRay.x264-Group", 5500).with_identifier_matched();
        assert_eq!(check(&filter(), by_id, &media, "720p"), Ok(()));
    }

    #[test]
    fn test_is_correct_logs_and_returns_bool() {
        let f = filter();
        let mut good = torrent("Movie.Name.2010.720p.BluRay.x264-Group", 5500);
        assert!(f.is_correct(&mut good, &media(), &tier("720p"), &entry("720p")));

        let mut bad = torrent("Movie.Name.2010.720p.BluRay.x264-Group", 50);
        assert!(!f.is_correct(&mut bad, &media(), &tier("720p"), &entry("720p")));
    }
}
