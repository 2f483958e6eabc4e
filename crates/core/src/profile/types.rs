//! Quality profiles: ordered tier preferences for a wanted item.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from validating a profile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Profile {profile} has no qualities")]
    Empty { profile: String },

    #[error("Profile {profile}: {field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        profile: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Result of comparing two qualities within a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRank {
    Higher,
    Equal,
    Lower,
}

/// Ordered tier preferences, stored as parallel arrays aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Tier identifiers, best first.
    pub qualities: Vec<String>,
    /// Stop searching once the tier at this index is satisfied.
    pub finish: Vec<bool>,
    /// Minimum release age in days before accepting this tier.
    pub wait_for: Vec<u32>,
    /// Desired 3D flag per tier. Empty means no tier wants 3D.
    #[serde(default, rename = "3d")]
    pub three_d: Vec<bool>,
    #[serde(default = "default_minimum_score")]
    pub minimum_score: i64,
    /// Days a finishing release must age before the item counts as done.
    #[serde(default)]
    pub stop_after: u32,
}

fn default_minimum_score() -> i64 {
    1
}

/// One tier of a profile, resolved from the parallel arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub index: usize,
    pub quality: String,
    pub finish: bool,
    pub wait_for: u32,
    pub is_3d: bool,
    pub minimum_score: i64,
}

impl Profile {
    /// Profile where every tier finishes and nothing waits.
    pub fn new(id: impl Into<String>, qualities: &[&str]) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            qualities: qualities.iter().map(|q| q.to_string()).collect(),
            finish: vec![true; qualities.len()],
            wait_for: vec![0; qualities.len()],
            three_d: vec![],
            minimum_score: default_minimum_score(),
            stop_after: 0,
        }
    }

    /// Check that every parallel array lines up with `qualities`.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let expected = self.qualities.len();
        if expected == 0 {
            return Err(ProfileError::Empty {
                profile: self.id.clone(),
            });
        }

        let fields = [
            ("finish", self.finish.len()),
            ("wait_for", self.wait_for.len()),
        ];
        for (field, actual) in fields {
            if actual != expected {
                return Err(self.mismatch(field, expected, actual));
            }
        }

        if !self.three_d.is_empty() && self.three_d.len() != expected {
            return Err(self.mismatch("3d", expected, self.three_d.len()));
        }

        Ok(())
    }

    fn mismatch(&self, field: &'static str, expected: usize, actual: usize) -> ProfileError {
        ProfileError::LengthMismatch {
            profile: self.id.clone(),
            field,
            expected,
            actual,
        }
    }

    pub fn len(&self) -> usize {
        self.qualities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualities.is_empty()
    }

    fn is_3d_at(&self, index: usize) -> bool {
        self.three_d.get(index).copied().unwrap_or(false)
    }

    /// Resolved entry at `index`.
    pub fn entry(&self, index: usize) -> Option<ProfileEntry> {
        let quality = self.qualities.get(index)?;
        Some(ProfileEntry {
            index,
            quality: quality.clone(),
            finish: self.finish.get(index).copied().unwrap_or(false),
            wait_for: self.wait_for.get(index).copied().unwrap_or(0),
            is_3d: self.is_3d_at(index),
            minimum_score: self.minimum_score,
        })
    }

    /// All entries, best first.
    pub fn entries(&self) -> Vec<ProfileEntry> {
        (0..self.qualities.len()).filter_map(|i| self.entry(i)).collect()
    }

    /// Position of a quality with the given 3D flag.
    pub fn index_of(&self, quality: &str, is_3d: bool) -> Option<usize> {
        self.qualities
            .iter()
            .enumerate()
            .position(|(i, q)| q == quality && self.is_3d_at(i) == is_3d)
    }

    /// Whether owning this quality means the item is done.
    ///
    /// The first tier always finishes; others only when flagged `finish` and
    /// the release is at least `stop_after` days old. Qualities outside the
    /// profile never finish.
    pub fn is_finish(&self, quality: &str, is_3d: bool, release_age_days: i64) -> bool {
        match self.index_of(quality, is_3d) {
            Some(0) => true,
            Some(index) => {
                self.finish.get(index).copied().unwrap_or(false)
                    && release_age_days >= i64::from(self.stop_after)
            }
            None => false,
        }
    }

    /// Rank `quality` against `compare_with`.
    ///
    /// A quality this profile does not want is lower than anything; anything
    /// wanted is higher than an unwanted comparison.
    pub fn compare(
        &self,
        quality: &str,
        is_3d: bool,
        compare_with: &str,
        compare_is_3d: bool,
    ) -> QualityRank {
        let Some(order) = self.index_of(quality, is_3d) else {
            return QualityRank::Lower;
        };
        let Some(compare_order) = self.index_of(compare_with, compare_is_3d) else {
            return QualityRank::Higher;
        };

        match order.cmp(&compare_order) {
            std::cmp::Ordering::Greater => QualityRank::Lower,
            std::cmp::Ordering::Equal => QualityRank::Equal,
            std::cmp::Ordering::Less => QualityRank::Higher,
        }
    }
}
