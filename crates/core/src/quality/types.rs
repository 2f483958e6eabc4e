//! Types for the quality classification system.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A vocabulary entry that counts as evidence for a tier.
///
/// Plain words must appear as a token; word tuples need all of their parts
/// present somewhere in the token set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagMatcher {
    Word(String),
    AllOf(Vec<String>),
}

impl TagMatcher {
    /// Single-word matcher.
    pub fn word(word: &str) -> Self {
        TagMatcher::Word(word.to_lowercase())
    }

    /// Tuple matcher, every part must be present.
    pub fn all_of(parts: &[&str]) -> Self {
        TagMatcher::AllOf(parts.iter().map(|p| p.to_lowercase()).collect())
    }

    /// Whether the entry is satisfied by the given token set.
    pub fn matches(&self, words: &HashSet<&str>) -> bool {
        match self {
            TagMatcher::Word(word) => words.contains(word.as_str()),
            TagMatcher::AllOf(parts) => {
                !parts.is_empty() && parts.iter().all(|p| words.contains(p.as_str()))
            }
        }
    }
}

/// One discrete quality class.
///
/// Sizes are in megabytes, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityTier {
    /// Unique key (e.g. "720p", "brrip").
    pub identifier: String,
    /// Display name.
    pub label: String,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub allows_3d: bool,
    pub size_min: u64,
    pub size_max: u64,
    /// Expected size of a typical release, within `[size_min, size_max]`.
    pub median_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub alternative: Vec<TagMatcher>,
    #[serde(default)]
    pub tags: Vec<TagMatcher>,
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Tiers this one may legitimately satisfy when no exact match exists.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Position in the catalog. Lower is better quality.
    #[serde(default)]
    pub order: usize,
}

impl QualityTier {
    /// Whether a size in MB lies within the inclusive bounds.
    pub fn size_in_range(&self, size_mb: u64) -> bool {
        self.size_min <= size_mb && size_mb <= self.size_max
    }
}

/// Persisted override of a tier's size bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOverride {
    pub identifier: String,
    pub size_min: u64,
    pub size_max: u64,
}

/// The three families of 3D evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThreeDFamily {
    #[serde(rename = "sbs")]
    SideBySide,
    #[serde(rename = "ou")]
    OverUnder,
    #[serde(rename = "3d")]
    Generic,
}

impl ThreeDFamily {
    /// Families in evaluation order.
    pub const ALL: [ThreeDFamily; 3] = [
        ThreeDFamily::SideBySide,
        ThreeDFamily::OverUnder,
        ThreeDFamily::Generic,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ThreeDFamily::SideBySide => "sbs",
            ThreeDFamily::OverUnder => "ou",
            ThreeDFamily::Generic => "3d",
        }
    }

    /// Vocabulary that signals this family.
    pub fn vocabulary(&self) -> Vec<TagMatcher> {
        match self {
            ThreeDFamily::SideBySide => vec![
                TagMatcher::all_of(&["half", "sbs"]),
                TagMatcher::word("hsbs"),
                TagMatcher::all_of(&["full", "sbs"]),
                TagMatcher::word("fsbs"),
            ],
            ThreeDFamily::OverUnder => vec![
                TagMatcher::all_of(&["half", "ou"]),
                TagMatcher::word("hou"),
                TagMatcher::all_of(&["full", "ou"]),
                TagMatcher::word("fou"),
            ],
            ThreeDFamily::Generic => vec![
                TagMatcher::word("2d3d"),
                TagMatcher::word("3d2d"),
                TagMatcher::word("3d"),
            ],
        }
    }
}

/// Accumulated evidence for a single tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierScore {
    pub identifier: String,
    pub score: f64,
    /// 3D evidence counters per family. Non-empty means 3D.
    pub threed: BTreeMap<ThreeDFamily, f64>,
}

/// Per-invocation scores for every tier, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreTable {
    entries: Vec<TierScore>,
}

impl ScoreTable {
    /// A zeroed table for the given tiers.
    pub fn new(tiers: &[QualityTier]) -> Self {
        Self {
            entries: tiers
                .iter()
                .map(|t| TierScore {
                    identifier: t.identifier.clone(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&TierScore> {
        self.entries.iter().find(|e| e.identifier == identifier)
    }

    /// Score of a tier, 0 for unknown identifiers.
    pub fn score_of(&self, identifier: &str) -> f64 {
        self.get(identifier).map(|e| e.score).unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[TierScore] {
        &self.entries
    }

    pub(crate) fn entry_mut(&mut self, order: usize) -> Option<&mut TierScore> {
        self.entries.get_mut(order)
    }

    /// Best entry; stable first-max so better tiers win ties.
    /// `None` when no tier has a positive score.
    pub fn winner(&self) -> Option<&TierScore> {
        let mut best: Option<&TierScore> = None;
        for entry in &self.entries {
            if entry.score <= 0.0 {
                continue;
            }
            match best {
                Some(b) if entry.score <= b.score => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}

/// Result of a confident guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityGuess {
    pub tier: QualityTier,
    pub is_3d: bool,
}

impl QualityGuess {
    pub fn identifier(&self) -> &str {
        &self.tier.identifier
    }
}

/// Catalog loading errors. Always fatal at startup.
#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Duplicate quality identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Unknown quality identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Invalid size range for {identifier}: {size_min}-{size_max} MB (median {median_size})")]
    InvalidSizeRange {
        identifier: String,
        size_min: u64,
        size_max: u64,
        median_size: u64,
    },

    #[error("Failed to parse quality catalog: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matcher_tuple_needs_all_parts() {
        let words: HashSet<&str> = ["br", "rip", "movie"].into_iter().collect();
        assert!(TagMatcher::all_of(&["br", "rip"]).matches(&words));
        assert!(!TagMatcher::all_of(&["br", "disk"]).matches(&words));
        assert!(TagMatcher::word("movie").matches(&words));
        assert!(!TagMatcher::word("bdrip").matches(&words));
    }

    #[test]
    fn test_tag_matcher_deserializes_words_and_tuples() {
        let parsed: Vec<TagMatcher> = serde_json::from_str(r#"["bd25", ["br", "disk"]]"#).unwrap();
        assert_eq!(parsed[0], TagMatcher::word("bd25"));
        assert_eq!(parsed[1], TagMatcher::all_of(&["br", "disk"]));
    }

    #[test]
    fn test_winner_prefers_first_on_tie() {
        let mut table = ScoreTable {
            entries: vec![
                TierScore {
                    identifier: "a".into(),
                    score: 10.0,
                    ..Default::default()
                },
                TierScore {
                    identifier: "b".into(),
                    score: 10.0,
                    ..Default::default()
                },
            ],
        };
        assert_eq!(table.winner().unwrap().identifier, "a");

        table.entries[1].score = 11.0;
        assert_eq!(table.winner().unwrap().identifier, "b");
    }

    #[test]
    fn test_winner_none_when_nothing_positive() {
        let table = ScoreTable {
            entries: vec![TierScore {
                identifier: "a".into(),
                score: 0.0,
                ..Default::default()
            }],
        };
        assert!(table.winner().is_none());
    }

    #[test]
    fn test_three_d_family_serialization() {
        assert_eq!(
            serde_json::to_string(&ThreeDFamily::Generic).unwrap(),
            "\"3d\""
        );
        assert_eq!(ThreeDFamily::SideBySide.tag(), "sbs");
    }
}
