//! Name/year extraction from scene-style release names.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::text::{simplified_words, simplify};

/// Words that end the title part of a release name.
const RELEASE_TAGS: &[&str] = &[
    "2160p", "1080p", "1080i", "720p", "576p", "480p", "bluray", "blu", "bdrip", "brrip", "br",
    "bd25", "bd50", "bdmv", "m2ts", "dvdrip", "dvd", "dvdr", "dvd9", "dvdscr", "dvdscreener",
    "screener", "scr", "r5", "r6", "tc", "ts", "cam", "camrip", "hdcam", "hdts", "telesync",
    "telecine", "hdtv", "hdrip", "webrip", "webdl", "x264", "h264", "x265", "h265", "hevc",
    "xvid", "divx", "avc", "ac3", "dts", "aac", "remux", "proper", "repack", "limited",
    "internal", "extended", "unrated", "multi", "subbed", "dubbed", "german", "french",
    "truefrench", "dutch", "italian", "spanish", "swedish", "danish", "korean", "dl", "3d",
    "sbs", "hsbs", "ou", "hou", "pal", "ntsc", "iso", "img", "mkv", "avi", "mp4",
];

/// Name and year parsed out of a raw release name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalTitle {
    /// Simplified title words joined by single spaces.
    pub name: String,
    pub year: Option<i32>,
}

impl CanonicalTitle {
    pub fn words(&self) -> HashSet<&str> {
        self.name.split(' ').filter(|w| !w.is_empty()).collect()
    }
}

/// Turns a raw release name into the title it refers to.
pub trait TitleMatcher: Send + Sync {
    fn canonicalize(&self, raw_name: &str) -> CanonicalTitle;
}

/// Cuts the name at the first release tag and takes the last plausible year
/// before it.
#[derive(Debug, Clone)]
pub struct SceneTitleMatcher {
    tags: HashSet<String>,
}

impl Default for SceneTitleMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTitleMatcher {
    pub fn new() -> Self {
        Self {
            tags: RELEASE_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Add extra words that end a title (site-specific tags).
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags
            .extend(tags.into_iter().map(|t| t.as_ref().to_lowercase()));
        self
    }
}

fn parse_year(word: &str) -> Option<i32> {
    if word.len() != 4 {
        return None;
    }
    word.parse::<i32>()
        .ok()
        .filter(|y| (1900..=2099).contains(y))
}

impl TitleMatcher for SceneTitleMatcher {
    fn canonicalize(&self, raw_name: &str) -> CanonicalTitle {
        let words = simplified_words(raw_name);
        if words.is_empty() {
            return CanonicalTitle::default();
        }

        // The first word always belongs to the title, even if it looks like a tag.
        let cut = words
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, w)| self.tags.contains(w.as_str()))
            .map(|(i, _)| i)
            .unwrap_or(words.len());

        let year_at = (1..cut)
            .rev()
            .find_map(|i| parse_year(&words[i]).map(|y| (i, y)));

        match year_at {
            Some((index, year)) => CanonicalTitle {
                name: words[..index].join(" "),
                year: Some(year),
            },
            None => CanonicalTitle {
                name: words[..cut].join(" "),
                year: None,
            },
        }
    }
}

/// Whether a release name refers to `title`: the release's title words must
/// equal the title's words. The name is also tried through its
/// double-quoted part and its longest bracket-separated segment.
pub fn correct_name(matcher: &dyn TitleMatcher, release_name: &str, title: &str) -> bool {
    let title_words: HashSet<String> = simplified_words(title).into_iter().collect();
    if title_words.is_empty() {
        return false;
    }

    release_name_variants(release_name).iter().any(|variant| {
        let canonical = matcher.canonicalize(variant);
        let words = canonical.words();
        !words.is_empty()
            && words.len() == title_words.len()
            && title_words.iter().all(|w| words.contains(w.as_str()))
    })
}

/// Whether the year implied by the release name is within `range` of `year`.
pub fn correct_year(matcher: &dyn TitleMatcher, release_name: &str, year: i32, range: i32) -> bool {
    let found = matcher.canonicalize(release_name).year;
    let matches = found.is_some_and(|y| (year - range..=year + range).contains(&y));
    debug!(
        "Release year {:?} {} range of {} (+/- {})",
        found,
        if matches { "within" } else { "outside" },
        year,
        range
    );
    matches
}

fn release_name_variants(name: &str) -> Vec<String> {
    let mut variants = vec![name.to_string()];

    let quoted: Vec<&str> = name.splitn(3, '"').collect();
    if quoted.len() == 3 && !quoted[1].trim().is_empty() {
        variants.push(quoted[1].to_string());
    }

    if let Some(longest) = name.split(['[', ']']).max_by_key(|s| s.len()) {
        variants.push(longest.to_string());
    }

    let mut seen = HashSet::new();
    variants.retain(|v| seen.insert(simplify(v)));
    variants
}
