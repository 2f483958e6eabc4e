//! Mock release-date lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::WantedMedia;
use crate::orchestrator::{ReleaseDateLookup, ReleaseDates};

/// Release dates keyed by media ID; unknown items have no dates.
#[derive(Debug, Clone, Default)]
pub struct MockReleaseDates {
    dates: Arc<RwLock<HashMap<String, ReleaseDates>>>,
}

impl MockReleaseDates {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_dates(&self, media_id: &str, dates: ReleaseDates) {
        self.dates.write().await.insert(media_id.to_string(), dates);
    }
}

#[async_trait]
impl ReleaseDateLookup for MockReleaseDates {
    async fn release_dates(&self, media: &WantedMedia) -> Option<ReleaseDates> {
        self.dates.read().await.get(&media.id).copied()
    }
}
