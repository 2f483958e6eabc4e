//! Wanted media and the releases known for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::searcher::Protocol;

/// Library status of a wanted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    /// Still looking for (a better) release.
    Active,
    /// Satisfied, no more searching.
    Done,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Active => "active",
            MediaStatus::Done => "done",
        }
    }
}

/// Per-category word rules, merged with the global searcher words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub required_words: String,
    #[serde(default)]
    pub ignored_words: String,
}

/// A movie the user wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WantedMedia {
    pub id: String,
    /// External identifier (IMDB `tt` id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Known titles; the first one is the default title.
    pub titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub status: MediaStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl WantedMedia {
    /// An active item with a single title.
    pub fn new(id: impl Into<String>, title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            id: id.into(),
            identifier: None,
            titles: vec![title.into()],
            year,
            status: MediaStatus::Active,
            profile_id: None,
            category: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    pub fn with_alternate_title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(title.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_status(mut self, status: MediaStatus) -> Self {
        self.status = status;
        self
    }

    /// Default title, if any title is known.
    pub fn title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str).filter(|t| !t.is_empty())
    }

    /// Title plus year, for log lines.
    pub fn display_name(&self) -> String {
        match (self.title(), self.year) {
            (Some(title), Some(year)) => format!("{} ({})", title, year),
            (Some(title), None) => title.to_string(),
            (None, _) => self.id.clone(),
        }
    }
}

/// Lifecycle of a release known for a wanted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    /// Found by a search, not downloaded.
    Available,
    /// Handed to the downloader.
    Snatched,
    /// Downloaded and in the library.
    Done,
    /// Skipped by the user or by "try next release".
    Ignored,
    /// Download failed.
    Failed,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Available => "available",
            ReleaseStatus::Snatched => "snatched",
            ReleaseStatus::Done => "done",
            ReleaseStatus::Ignored => "ignored",
            ReleaseStatus::Failed => "failed",
        }
    }

    /// Whether the release is blocked from being downloaded again.
    pub fn is_blocked(&self) -> bool {
        matches!(self, ReleaseStatus::Ignored | ReleaseStatus::Failed)
    }

    /// Whether the release counts as owned for "better quality" checks.
    pub fn is_owned(&self) -> bool {
        matches!(self, ReleaseStatus::Snatched | ReleaseStatus::Done)
    }
}

/// A release persisted for a wanted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownRelease {
    pub id: String,
    pub media_id: String,
    /// md5 of the release url, unique per media.
    pub identifier: String,
    /// Quality tier identifier.
    pub quality: String,
    #[serde(default)]
    pub is_3d: bool,
    pub status: ReleaseStatus,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<u64>,
    #[serde(default)]
    pub age_days: u32,
    #[serde(default)]
    pub provider_score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    pub protocol: Protocol,
    pub provider: String,
    pub last_edit: DateTime<Utc>,
}

impl KnownRelease {
    /// Whole days since the release was last touched.
    pub fn days_since_edit(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_edit).num_days().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title() {
        let media = WantedMedia::new("m1", "Movie Name", Some(2010));
        assert_eq!(media.title(), Some("Movie Name"));
        assert_eq!(media.display_name(), "Movie Name (2010)");

        let untitled = WantedMedia {
            titles: vec![],
            ..media
        };
        assert_eq!(untitled.title(), None);
        assert_eq!(untitled.display_name(), "m1");
    }

    #[test]
    fn test_release_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ReleaseStatus::Available).unwrap(),
            "\"available\""
        );
        assert!(ReleaseStatus::Failed.is_blocked());
        assert!(!ReleaseStatus::Snatched.is_blocked());
        assert!(ReleaseStatus::Done.is_owned());
        assert!(!ReleaseStatus::Available.is_owned());
    }

    #[test]
    fn test_media_round_trip_defaults() {
        let json = r#"{"id":"m1","titles":["A"],"status":"active"}"#;
        let media: WantedMedia = serde_json::from_str(json).unwrap();
        assert_eq!(media.year, None);
        assert_eq!(media.profile_id, None);
        assert_eq!(media.status, MediaStatus::Active);
    }
}
