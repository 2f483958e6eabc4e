//! SQLite-backed media store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{MediaStore, StoreError};
use crate::media::{KnownRelease, MediaStatus, ReleaseStatus, WantedMedia};
use crate::profile::Profile;
use crate::quality::SizeOverride;

/// SQLite-backed media store.
pub struct SqliteMediaStore {
    conn: Mutex<Connection>,
}

impl SqliteMediaStore {
    /// Create a new SQLite store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                doc TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS releases (
                id TEXT PRIMARY KEY,
                media_id TEXT NOT NULL,
                identifier TEXT NOT NULL,
                status TEXT NOT NULL,
                doc TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (media_id, identifier)
            );

            CREATE TABLE IF NOT EXISTS quality_sizes (
                identifier TEXT PRIMARY KEY,
                size_min INTEGER NOT NULL,
                size_max INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_media_status ON media(status);
            CREATE INDEX IF NOT EXISTS idx_releases_media ON releases(media_id);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(format!("connection lock poisoned: {}", e)))
    }
}

fn to_doc<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_doc<T: DeserializeOwned>(doc: &str) -> Result<T, StoreError> {
    serde_json::from_str(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl MediaStore for SqliteMediaStore {
    fn save_media(&self, media: &WantedMedia) -> Result<(), StoreError> {
        let doc = to_doc(media)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO media (id, status, doc, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET status = excluded.status, doc = excluded.doc, updated_at = excluded.updated_at",
            params![media.id, media.status.as_str(), doc, Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get_media(&self, id: &str) -> Result<Option<WantedMedia>, StoreError> {
        let conn = self.lock()?;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM media WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;
        doc.as_deref().map(from_doc).transpose()
    }

    fn media_with_status(&self, status: MediaStatus) -> Result<Vec<WantedMedia>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT doc FROM media WHERE status = ? ORDER BY updated_at ASC, id ASC")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![status.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;

        let mut media = Vec::new();
        for row in rows {
            media.push(from_doc(&row.map_err(db_err)?)?);
        }
        Ok(media)
    }

    fn set_media_status(&self, id: &str, status: MediaStatus) -> Result<(), StoreError> {
        let mut media = self
            .get_media(id)?
            .ok_or_else(|| StoreError::NotFound(format!("media {}", id)))?;
        if media.status == status {
            return Ok(());
        }
        media.status = status;
        self.save_media(&media)
    }

    fn delete_media(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM releases WHERE media_id = ?", params![id])
            .map_err(db_err)?;
        conn.execute("DELETE FROM media WHERE id = ?", params![id])
            .map_err(db_err)?;
        Ok(())
    }

    fn save_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let doc = to_doc(profile)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO profiles (id, doc) VALUES (?, ?)",
            params![profile.id, doc],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        let conn = self.lock()?;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM profiles WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;
        doc.as_deref().map(from_doc).transpose()
    }

    fn releases_for_media(&self, media_id: &str) -> Result<Vec<KnownRelease>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT doc FROM releases WHERE media_id = ? ORDER BY updated_at ASC, id ASC")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![media_id], |row| row.get::<_, String>(0))
            .map_err(db_err)?;

        let mut releases = Vec::new();
        for row in rows {
            releases.push(from_doc(&row.map_err(db_err)?)?);
        }
        Ok(releases)
    }

    fn find_release(
        &self,
        media_id: &str,
        identifier: &str,
    ) -> Result<Option<KnownRelease>, StoreError> {
        let conn = self.lock()?;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM releases WHERE media_id = ? AND identifier = ?",
                params![media_id, identifier],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        doc.as_deref().map(from_doc).transpose()
    }

    fn save_release(&self, release: &KnownRelease) -> Result<(), StoreError> {
        let doc = to_doc(release)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO releases (id, media_id, identifier, status, doc, updated_at) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(media_id, identifier) DO UPDATE SET status = excluded.status, doc = excluded.doc, updated_at = excluded.updated_at",
            params![
                release.id,
                release.media_id,
                release.identifier,
                release.status.as_str(),
                doc,
                release.last_edit.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn update_release_status(&self, id: &str, status: ReleaseStatus) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM releases WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;
        let mut release: KnownRelease = match doc {
            Some(doc) => from_doc(&doc)?,
            None => return Err(StoreError::NotFound(format!("release {}", id))),
        };

        release.status = status;
        release.last_edit = Utc::now();
        conn.execute(
            "UPDATE releases SET status = ?, doc = ?, updated_at = ? WHERE id = ?",
            params![
                status.as_str(),
                to_doc(&release)?,
                release.last_edit.to_rfc3339(),
                id
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn delete_release(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM releases WHERE id = ?", params![id])
            .map_err(db_err)?;
        Ok(())
    }

    fn quality_sizes(&self) -> Result<Vec<SizeOverride>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT identifier, size_min, size_max FROM quality_sizes ORDER BY identifier")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SizeOverride {
                    identifier: row.get(0)?,
                    size_min: row.get::<_, i64>(1)?.max(0) as u64,
                    size_max: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })
            .map_err(db_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn save_quality_size(&self, size: &SizeOverride) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO quality_sizes (identifier, size_min, size_max) VALUES (?, ?, ?)",
            params![size.identifier, size.size_min as i64, size.size_max as i64],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::Protocol;
    use chrono::Duration;

    fn release(media_id: &str, identifier: &str, status: ReleaseStatus) -> KnownRelease {
        KnownRelease {
            id: format!("{}-{}", media_id, identifier),
            media_id: media_id.to_string(),
            identifier: identifier.to_string(),
            quality: "720p".to_string(),
            is_3d: false,
            status,
            name: "Movie.Name.2010.720p.x264".to_string(),
            url: format!("http://example.org/{}", identifier),
            size_mb: Some(4500),
            age_days: 3,
            provider_score: 0,
            seeders: Some(10),
            protocol: Protocol::Torrent,
            provider: "mock".to_string(),
            last_edit: Utc::now() - Duration::days(2),
        }
    }

    #[test]
    fn test_media_roundtrip() {
        let store = SqliteMediaStore::in_memory().unwrap();
        let media = WantedMedia::new("m1", "Movie Name", Some(2010))
            .with_identifier("tt1234567")
            .with_profile("p1");

        store.save_media(&media).unwrap();
        let loaded = store.get_media("m1").unwrap().unwrap();
        assert_eq!(loaded, media);
        assert!(store.get_media("missing").unwrap().is_none());
    }

    #[test]
    fn test_media_with_status() {
        let store = SqliteMediaStore::in_memory().unwrap();
        store
            .save_media(&WantedMedia::new("m1", "One", Some(2010)))
            .unwrap();
        store
            .save_media(&WantedMedia::new("m2", "Two", Some(2011)).with_status(MediaStatus::Done))
            .unwrap();

        let active = store.media_with_status(MediaStatus::Active).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "m1");

        store.set_media_status("m1", MediaStatus::Done).unwrap();
        assert!(store
            .media_with_status(MediaStatus::Active)
            .unwrap()
            .is_empty());
        assert_eq!(store.media_with_status(MediaStatus::Done).unwrap().len(), 2);
    }

    #[test]
    fn test_set_status_missing_media() {
        let store = SqliteMediaStore::in_memory().unwrap();
        let result = store.set_media_status("nope", MediaStatus::Done);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_profile_roundtrip() {
        let store = SqliteMediaStore::in_memory().unwrap();
        let profile = Profile::new("p1", &["1080p", "720p"]);
        store.save_profile(&profile).unwrap();
        assert_eq!(store.get_profile("p1").unwrap().unwrap(), profile);
        assert!(store.get_profile("p2").unwrap().is_none());
    }

    #[test]
    fn test_save_release_upserts_by_identifier() {
        let store = SqliteMediaStore::in_memory().unwrap();
        let mut rel = release("m1", "abc", ReleaseStatus::Available);
        store.save_release(&rel).unwrap();

        rel.seeders = Some(99);
        store.save_release(&rel).unwrap();

        let all = store.releases_for_media("m1").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].seeders, Some(99));

        let found = store.find_release("m1", "abc").unwrap().unwrap();
        assert_eq!(found.id, rel.id);
        assert!(store.find_release("m2", "abc").unwrap().is_none());
    }

    #[test]
    fn test_update_release_status_touches_last_edit() {
        let store = SqliteMediaStore::in_memory().unwrap();
        let rel = release("m1", "abc", ReleaseStatus::Available);
        store.save_release(&rel).unwrap();

        store
            .update_release_status(&rel.id, ReleaseStatus::Snatched)
            .unwrap();
        let loaded = store.find_release("m1", "abc").unwrap().unwrap();
        assert_eq!(loaded.status, ReleaseStatus::Snatched);
        assert!(loaded.last_edit > rel.last_edit);

        let missing = store.update_release_status("nope", ReleaseStatus::Done);
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_media_removes_releases() {
        let store = SqliteMediaStore::in_memory().unwrap();
        store
            .save_media(&WantedMedia::new("m1", "One", Some(2010)))
            .unwrap();
        store
            .save_release(&release("m1", "a", ReleaseStatus::Available))
            .unwrap();
        store
            .save_release(&release("m1", "b", ReleaseStatus::Snatched))
            .unwrap();

        store.delete_release("m1-a").unwrap();
        assert_eq!(store.releases_for_media("m1").unwrap().len(), 1);

        store.delete_media("m1").unwrap();
        assert!(store.get_media("m1").unwrap().is_none());
        assert!(store.releases_for_media("m1").unwrap().is_empty());
    }

    #[test]
    fn test_quality_sizes() {
        let store = SqliteMediaStore::in_memory().unwrap();
        assert!(store.quality_sizes().unwrap().is_empty());

        let size = SizeOverride {
            identifier: "720p".to_string(),
            size_min: 1000,
            size_max: 6000,
        };
        store.save_quality_size(&size).unwrap();
        store.save_quality_size(&size).unwrap();
        assert_eq!(store.quality_sizes().unwrap(), vec![size]);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hunter.db");
        {
            let store = SqliteMediaStore::new(&path).unwrap();
            store
                .save_media(&WantedMedia::new("m1", "One", Some(2010)))
                .unwrap();
        }
        let store = SqliteMediaStore::new(&path).unwrap();
        assert!(store.get_media("m1").unwrap().is_some());
    }
}
