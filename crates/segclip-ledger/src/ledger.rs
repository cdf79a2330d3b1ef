//! Video ledger operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use segclip_models::VideoRecord;

use crate::error::{LedgerError, LedgerResult};

/// Remote collaborator that can report whether an uploaded file is
/// still live on the API side.
///
/// Implementations must swallow query failures: "does it exist" is
/// inherently boolean from the caller's perspective, so not-found and
/// transport errors alike come back as `false`.
#[async_trait]
pub trait RemoteFileCheck: Send + Sync {
    /// True only if the resource exists and reports the active state.
    async fn file_is_active(&self, file_name: &str) -> bool;
}

/// Outcome of a [`VideoLedger::cleanup_expired`] pass.
///
/// `kept` enumerates expired records that were retained because the
/// remote copy still exists; non-expired records are kept implicitly
/// and do not appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<u64>,
    pub kept: Vec<u64>,
}

/// Fields that [`VideoLedger::update`] may change.
///
/// `display_name` and `description` are overwritten wholesale;
/// `metadata` is merged key-wise (existing keys overwritten, others
/// preserved).
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<HashMap<String, Value>>,
}

/// Persisted store shape: one key mapping to the ordered records.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerStore {
    videos: Vec<VideoRecord>,
}

/// Flat-file registry of uploaded videos.
#[derive(Debug, Clone)]
pub struct VideoLedger {
    path: PathBuf,
}

impl VideoLedger {
    /// Open a ledger at `path`, creating an empty store file if needed.
    pub async fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let ledger = Self {
            path: path.as_ref().to_path_buf(),
        };
        if !ledger.path.exists() {
            ledger.save(&LedgerStore::default()).await?;
            info!("Created new video ledger at {}", ledger.path.display());
        }
        Ok(ledger)
    }

    /// Path of the backing store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> LedgerResult<LedgerStore> {
        let data = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&data).map_err(|source| LedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Rewrite the whole store. The new content is fully constructed in
    /// memory first, so a crash mid-operation loses the pending
    /// mutation but cannot corrupt the file.
    async fn save(&self, store: &LedgerStore) -> LedgerResult<()> {
        let data = serde_json::to_string_pretty(store)?;
        fs::write(&self.path, data).await?;
        Ok(())
    }

    /// Record a freshly uploaded video.
    ///
    /// Assigns `id = count + 1`, defaults the display name to the
    /// filename stem and stamps `uploaded_at` with the current time.
    pub async fn add(
        &self,
        local_path: &Path,
        file_id: &str,
        file_name: &str,
        display_name: Option<&str>,
        description: Option<&str>,
        metadata: Option<HashMap<String, Value>>,
    ) -> LedgerResult<VideoRecord> {
        let mut store = self.load().await?;

        let display_name = match display_name {
            Some(name) => name.to_string(),
            None => file_stem(local_path),
        };

        let absolute = std::path::absolute(local_path)?;

        let record = VideoRecord {
            id: store.videos.len() as u64 + 1,
            display_name,
            local_path: absolute.to_string_lossy().into_owned(),
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            description: description.unwrap_or_default().to_string(),
            uploaded_at: Utc::now(),
            metadata: metadata.unwrap_or_default(),
        };

        store.videos.push(record.clone());
        self.save(&store).await?;

        info!(
            "Added video to ledger: {} (ID: {})",
            record.display_name, record.id
        );
        Ok(record)
    }

    /// Look up a record by id.
    pub async fn get(&self, id: u64) -> LedgerResult<Option<VideoRecord>> {
        let store = self.load().await?;
        Ok(store.videos.into_iter().find(|v| v.id == id))
    }

    /// Look up the first record with a given display name.
    pub async fn get_by_name(&self, display_name: &str) -> LedgerResult<Option<VideoRecord>> {
        let store = self.load().await?;
        Ok(store
            .videos
            .into_iter()
            .find(|v| v.display_name == display_name))
    }

    /// All records in insertion order.
    pub async fn list(&self) -> LedgerResult<Vec<VideoRecord>> {
        Ok(self.load().await?.videos)
    }

    /// Apply an update to the record with `id`.
    ///
    /// Returns whether a matching record was found.
    pub async fn update(&self, id: u64, update: RecordUpdate) -> LedgerResult<bool> {
        let mut store = self.load().await?;

        let Some(record) = store.videos.iter_mut().find(|v| v.id == id) else {
            return Ok(false);
        };

        if let Some(name) = update.display_name {
            record.display_name = name;
        }
        if let Some(description) = update.description {
            record.description = description;
        }
        if let Some(metadata) = update.metadata {
            // Shallow, key-wise overwrite
            record.metadata.extend(metadata);
        }

        self.save(&store).await?;
        info!("Updated video ID {id}");
        Ok(true)
    }

    /// Remove all records matching `id` (expected to be at most one).
    ///
    /// Returns whether anything was removed; the store is untouched on
    /// a miss.
    pub async fn delete(&self, id: u64) -> LedgerResult<bool> {
        let mut store = self.load().await?;
        let before = store.videos.len();
        store.videos.retain(|v| v.id != id);

        if store.videos.len() < before {
            self.save(&store).await?;
            info!("Deleted video ID {id} from ledger");
            return Ok(true);
        }
        Ok(false)
    }

    /// Query the remote collaborator for a record's file.
    pub async fn check_remote_exists(
        &self,
        record: &VideoRecord,
        remote: &dyn RemoteFileCheck,
    ) -> bool {
        remote.file_is_active(&record.file_name).await
    }

    /// Delete every locally expired record, optionally cross-checking
    /// the remote side first.
    ///
    /// With a collaborator handle, an expired record whose remote file
    /// still exists is kept (and reported in `kept`); without one,
    /// expired records are deleted unconditionally. The store is
    /// rewritten once after the full deletion set is known.
    pub async fn cleanup_expired(
        &self,
        remote: Option<&dyn RemoteFileCheck>,
    ) -> LedgerResult<CleanupReport> {
        let mut store = self.load().await?;
        let mut report = CleanupReport::default();

        for record in &store.videos {
            if !record.is_expired() {
                continue;
            }
            match remote {
                Some(remote) if remote.file_is_active(&record.file_name).await => {
                    debug!(
                        "Expired video ID {} still exists remotely, keeping",
                        record.id
                    );
                    report.kept.push(record.id);
                }
                _ => report.deleted.push(record.id),
            }
        }

        if !report.deleted.is_empty() {
            store.videos.retain(|v| !report.deleted.contains(&v.id));
            self.save(&store).await?;
            info!(
                "Cleanup removed {} expired video(s), kept {}",
                report.deleted.len(),
                report.kept.len()
            );
        }

        Ok(report)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    struct FakeRemote {
        active: Vec<String>,
    }

    #[async_trait]
    impl RemoteFileCheck for FakeRemote {
        async fn file_is_active(&self, file_name: &str) -> bool {
            self.active.iter().any(|n| n == file_name)
        }
    }

    async fn open_ledger(dir: &TempDir) -> VideoLedger {
        VideoLedger::open(dir.path().join("videos.json")).await.unwrap()
    }

    async fn add_sample(ledger: &VideoLedger, n: u32) -> VideoRecord {
        ledger
            .add(
                Path::new(&format!("/videos/sample{n}.mp4")),
                &format!("file{n}"),
                &format!("files/file{n}"),
                None,
                None,
                None,
            )
            .await
            .unwrap()
    }

    /// Rewrite a record's upload time so expiry paths can be exercised.
    async fn age_record(ledger: &VideoLedger, id: u64, hours: i64) {
        let data = fs::read_to_string(ledger.path()).await.unwrap();
        let mut store: LedgerStore = serde_json::from_str(&data).unwrap();
        let record = store.videos.iter_mut().find(|v| v.id == id).unwrap();
        record.uploaded_at = Utc::now() - Duration::hours(hours);
        fs::write(ledger.path(), serde_json::to_string_pretty(&store).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_creates_empty_store() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;
        assert!(ledger.path().exists());
        assert!(ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;

        let added = add_sample(&ledger, 1).await;
        let fetched = ledger.get(added.id).await.unwrap().unwrap();

        assert_eq!(fetched.file_id, "file1");
        assert_eq!(fetched.file_name, "files/file1");
        assert!(fetched.local_path.ends_with("sample1.mp4"));
        assert_eq!(fetched.display_name, "sample1");
    }

    #[tokio::test]
    async fn test_ids_strictly_increase() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;

        let first = add_sample(&ledger, 1).await;
        let second = add_sample(&ledger, 2).await;
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;

        add_sample(&ledger, 1).await;
        let found = ledger.get_by_name("sample1").await.unwrap();
        assert!(found.is_some());
        assert!(ledger.get_by_name("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_known_and_unknown() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;

        let record = add_sample(&ledger, 1).await;
        assert!(ledger.delete(record.id).await.unwrap());
        assert!(ledger.get(record.id).await.unwrap().is_none());

        // Unknown id: false, store unchanged
        assert!(!ledger.delete(99).await.unwrap());
        assert!(ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_overwrites_and_merges() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;
        let record = add_sample(&ledger, 1).await;

        let mut seed = HashMap::new();
        seed.insert("uri".to_string(), Value::from("https://old"));
        seed.insert("mime_type".to_string(), Value::from("video/mp4"));
        ledger
            .update(
                record.id,
                RecordUpdate {
                    metadata: Some(seed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut patch = HashMap::new();
        patch.insert("uri".to_string(), Value::from("https://new"));
        let found = ledger
            .update(
                record.id,
                RecordUpdate {
                    display_name: Some("renamed".to_string()),
                    description: Some("a chore video".to_string()),
                    metadata: Some(patch),
                },
            )
            .await
            .unwrap();
        assert!(found);

        let updated = ledger.get(record.id).await.unwrap().unwrap();
        assert_eq!(updated.display_name, "renamed");
        assert_eq!(updated.description, "a chore video");
        // Merged key overwritten, untouched key preserved
        assert_eq!(updated.metadata["uri"], Value::from("https://new"));
        assert_eq!(updated.metadata["mime_type"], Value::from("video/mp4"));

        assert!(!ledger.update(99, RecordUpdate::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_uploaded_at_survives_update() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;
        let record = add_sample(&ledger, 1).await;

        ledger
            .update(
                record.id,
                RecordUpdate {
                    description: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = ledger.get(record.id).await.unwrap().unwrap();
        assert_eq!(updated.uploaded_at, record.uploaded_at);
    }

    #[tokio::test]
    async fn test_cleanup_without_remote_deletes_expired_only() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;

        let old = add_sample(&ledger, 1).await;
        let fresh = add_sample(&ledger, 2).await;
        age_record(&ledger, old.id, 49).await;

        let report = ledger.cleanup_expired(None).await.unwrap();
        assert_eq!(report.deleted, vec![old.id]);
        assert!(report.kept.is_empty());

        assert!(ledger.get(old.id).await.unwrap().is_none());
        assert!(ledger.get(fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_expired_but_remote_alive() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;

        let alive = add_sample(&ledger, 1).await;
        let gone = add_sample(&ledger, 2).await;
        age_record(&ledger, alive.id, 50).await;
        age_record(&ledger, gone.id, 50).await;

        let remote = FakeRemote {
            active: vec![alive.file_name.clone()],
        };
        let report = ledger.cleanup_expired(Some(&remote)).await.unwrap();

        assert_eq!(report.kept, vec![alive.id]);
        assert_eq!(report.deleted, vec![gone.id]);
        assert!(ledger.get(alive.id).await.unwrap().is_some());
        assert!(ledger.get(gone.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_remote_exists_delegates() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir).await;
        let record = add_sample(&ledger, 1).await;

        let remote = FakeRemote {
            active: vec![record.file_name.clone()],
        };
        assert!(ledger.check_remote_exists(&record, &remote).await);

        let empty = FakeRemote { active: vec![] };
        assert!(!ledger.check_remote_exists(&record, &empty).await);
    }
}
