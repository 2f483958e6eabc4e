//! Persistence trait for wanted media, profiles and known releases.

use thiserror::Error;

use crate::media::{KnownRelease, MediaStatus, ReleaseStatus, WantedMedia};
use crate::profile::Profile;
use crate::quality::SizeOverride;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Trait for media storage backends.
pub trait MediaStore: Send + Sync {
    /// Insert or replace a wanted item.
    fn save_media(&self, media: &WantedMedia) -> Result<(), StoreError>;

    /// Get a wanted item by ID.
    fn get_media(&self, id: &str) -> Result<Option<WantedMedia>, StoreError>;

    /// All wanted items with the given status, oldest update first.
    fn media_with_status(&self, status: MediaStatus) -> Result<Vec<WantedMedia>, StoreError>;

    /// Update a wanted item's status.
    fn set_media_status(&self, id: &str, status: MediaStatus) -> Result<(), StoreError>;

    /// Delete a wanted item and its releases.
    fn delete_media(&self, id: &str) -> Result<(), StoreError>;

    /// Insert or replace a profile.
    fn save_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Get a profile by ID.
    fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError>;

    /// All releases known for a wanted item.
    fn releases_for_media(&self, media_id: &str) -> Result<Vec<KnownRelease>, StoreError>;

    /// Look up a release by its per-media identifier.
    fn find_release(
        &self,
        media_id: &str,
        identifier: &str,
    ) -> Result<Option<KnownRelease>, StoreError>;

    /// Insert or update a release, keyed by (media_id, identifier).
    fn save_release(&self, release: &KnownRelease) -> Result<(), StoreError>;

    /// Update a release's status.
    fn update_release_status(&self, id: &str, status: ReleaseStatus) -> Result<(), StoreError>;

    /// Delete a release.
    fn delete_release(&self, id: &str) -> Result<(), StoreError>;

    /// Persisted size overrides for quality tiers.
    fn quality_sizes(&self) -> Result<Vec<SizeOverride>, StoreError>;

    /// Persist a size override.
    fn save_quality_size(&self, size: &SizeOverride) -> Result<(), StoreError>;
}
