//! Types for the release correctness filter.

use thiserror::Error;

use crate::config::SearcherConfig;

/// Why a candidate was rejected. Exactly one per rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("outside retention, age is {age_days} days, needs {retention_days} or lower")]
    TooOld { age_days: u32, retention_days: u32 },

    #[error("required word missing")]
    MissingRequiredWords,

    #[error("contains ignored word group \"{group}\"")]
    ContainsIgnoredWords { group: String },

    #[error("contains adult words: {words}")]
    AdultContent { words: String },

    #[error("looking for {wanted}, found {found}")]
    WrongQuality { wanted: String, found: String },

    #[error("3D mismatch, wanted 3D: {wanted_3d}, release 3D: {found_3d}")]
    Wrong3D { wanted_3d: bool, found_3d: bool },

    #[error("size {size_mb} MB outside {size_min}-{size_max} MB")]
    SizeOutOfBounds {
        size_mb: u64,
        size_min: u64,
        size_max: u64,
    },

    #[error("provider extra check failed")]
    ExtraCheckFailed,

    #[error("undetermined naming, looking for {expected}")]
    TitleYearMismatch { expected: String },
}

impl RejectionReason {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectionReason::TooOld { .. } => "too_old",
            RejectionReason::MissingRequiredWords => "missing_required_words",
            RejectionReason::ContainsIgnoredWords { .. } => "contains_ignored_words",
            RejectionReason::AdultContent { .. } => "adult_content",
            RejectionReason::WrongQuality { .. } => "wrong_quality",
            RejectionReason::Wrong3D { .. } => "wrong_3d",
            RejectionReason::SizeOutOfBounds { .. } => "size_out_of_bounds",
            RejectionReason::ExtraCheckFailed => "extra_check_failed",
            RejectionReason::TitleYearMismatch { .. } => "title_year_mismatch",
        }
    }
}

/// Settings the filter reads from the searcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Usenet retention in days. 0 disables the check.
    pub retention_days: u32,
    pub required_words: String,
    pub ignored_words: String,
}

impl From<&SearcherConfig> for FilterConfig {
    fn from(config: &SearcherConfig) -> Self {
        Self {
            retention_days: config.retention_days,
            required_words: config.required_words.clone(),
            ignored_words: config.ignored_words.clone(),
        }
    }
}
