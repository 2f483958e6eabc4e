//! Release-date gating.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::media::WantedMedia;

const WEEK_SECS: i64 = 7 * 24 * 3600;

/// Known release dates as unix timestamps; 0 means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDates {
    #[serde(default)]
    pub theatrical: i64,
    #[serde(default)]
    pub disc: i64,
}

impl ReleaseDates {
    pub fn new(theatrical: i64, disc: i64) -> Self {
        Self { theatrical, disc }
    }

    pub fn is_unknown(&self) -> bool {
        self.theatrical == 0 && self.disc == 0
    }
}

/// Lookup of theatrical and disc release dates for a wanted item.
#[async_trait]
pub trait ReleaseDateLookup: Send + Sync {
    async fn release_dates(&self, media: &WantedMedia) -> Option<ReleaseDates>;
}

/// Lookup that never knows any dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReleaseDates;

#[async_trait]
impl ReleaseDateLookup for NoReleaseDates {
    async fn release_dates(&self, _media: &WantedMedia) -> Option<ReleaseDates> {
        None
    }
}

/// Whether a release of the given kind could plausibly exist at `now`.
///
/// `None` dates behave like all-zero dates.
pub fn could_be_released(
    is_pre_release: bool,
    dates: Option<&ReleaseDates>,
    year: Option<i32>,
    now: DateTime<Utc>,
) -> bool {
    let dates = dates.copied().unwrap_or_default();
    let now_year = now.year();
    let now_month = now.month();
    let now_ts = now.timestamp();

    let old_enough = match year {
        None => true,
        Some(y) => y < now_year - 1 || (y <= now_year - 1 && now_month > 4),
    };
    if old_enough && dates.is_unknown() {
        return true;
    }

    // +1 year is only allowed near the end of the year
    let add_year = if now_month > 10 { 1 } else { 0 };
    if matches!(year, Some(y) if y > now_year + add_year) {
        return false;
    }

    // pre-1970 dates
    if dates.theatrical < 0 || dates.disc < 0 {
        return true;
    }

    if is_pre_release {
        // a week before theaters
        return dates.theatrical - WEEK_SECS < now_ts;
    }

    // 12 weeks after theaters
    if dates.theatrical > 0 && dates.theatrical + 12 * WEEK_SECS < now_ts {
        return true;
    }

    // 4 weeks before the disc
    dates.disc > 0 && dates.disc - 4 * WEEK_SECS < now_ts
}
