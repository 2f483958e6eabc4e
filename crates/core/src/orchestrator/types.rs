//! Types for the search orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from host-facing orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Wanted item not found.
    #[error("media not found: {0}")]
    MediaNotFound(String),

    /// Profile arrays are inconsistent.
    #[error("invalid profile: {0}")]
    Profile(#[from] crate::profile::ProfileError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),
}

/// Where a wanted item is in its tier walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchState {
    #[default]
    Idle,
    Searching {
        tier_index: usize,
    },
    Snatched,
    /// Candidates exist but are younger than the tier's wait period.
    Waiting,
    Exhausted,
}

/// Per-item bookkeeping kept across searches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedItemSearchState {
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_ignored_eta_at: Option<DateTime<Utc>>,
    pub tier_index: usize,
    pub in_progress: bool,
    pub state: SearchState,
}

/// Outcome of searching one wanted item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub snatched: bool,
    pub waiting: bool,
    /// Tiers skipped because no release could exist yet.
    pub too_early: Vec<String>,
    /// Accepted releases found while the ETA was ignored.
    pub found_before_eta: usize,
    /// Accepted releases over all searched tiers.
    pub total_results: usize,
    /// The item was not searched (no profile, done, busy, no protocols).
    pub skipped: bool,
}

impl SearchReport {
    pub(crate) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Label for metrics.
    pub fn result(&self) -> &'static str {
        if self.skipped {
            "skipped"
        } else if self.snatched {
            "snatched"
        } else if self.waiting {
            "waiting"
        } else {
            "nothing_found"
        }
    }
}

/// Progress of a full search over all active items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProgress {
    pub total: usize,
    pub to_go: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_state_serialization() {
        let json = serde_json::to_string(&SearchState::Searching { tier_index: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"searching","tier_index":2}"#);

        let parsed: SearchState = serde_json::from_str(r#"{"type":"waiting"}"#).unwrap();
        assert_eq!(parsed, SearchState::Waiting);
    }

    #[test]
    fn test_report_result_labels() {
        assert_eq!(SearchReport::skipped().result(), "skipped");
        assert_eq!(SearchReport::default().result(), "nothing_found");

        let report = SearchReport {
            snatched: true,
            ..SearchReport::default()
        };
        assert_eq!(report.result(), "snatched");
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::MediaNotFound("m-1".to_string());
        assert_eq!(err.to_string(), "media not found: m-1");

        let err: OrchestratorError =
            crate::store::StoreError::Database("locked".to_string()).into();
        assert_eq!(err.to_string(), "store error: Database error: locked");
    }
}
