// In-memory remote store doubles
// Used by tests and offline development. Failure injection mirrors the ways
// the real backends reject: per-record upsert rejection, blanket photo-upload
// rejection, and per-path blob-delete rejection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Result, VisitLogError};
use crate::migration::{MigrationStatus, MigrationStatusStore};
use crate::record::{is_data_url, UpsertVisitRecord, VisitRecordRemote};
use crate::remote::{visit_photo_path, PhotoClient, VisitRecordClient};

/// In-memory visit-record collection keyed by user.
#[derive(Default)]
pub struct MemoryVisitRecordClient {
    records: Mutex<HashMap<String, HashMap<String, VisitRecordRemote>>>,
    fail_upserts_for: Mutex<HashSet<String>>,
    clock: AtomicI64,
    upsert_calls: AtomicUsize,
}

impl MemoryVisitRecordClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert of the given record id fail.
    pub fn fail_upserts_for(&self, record_id: &str) {
        self.fail_upserts_for
            .lock()
            .unwrap()
            .insert(record_id.to_string());
    }

    /// Total upsert calls, including rejected ones.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::Relaxed)
    }

    fn next_timestamp(&self) -> String {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        DateTime::<Utc>::from_timestamp(tick, 0)
            .unwrap_or_else(Utc::now)
            .to_rfc3339()
    }
}

#[async_trait]
impl VisitRecordClient for MemoryVisitRecordClient {
    async fn load(&self, user_id: &str) -> Result<Vec<VisitRecordRemote>> {
        let records = self.records.lock().unwrap();
        let mut out: Vec<VisitRecordRemote> = records
            .get(user_id)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn upsert(&self, user_id: &str, input: &UpsertVisitRecord) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::Relaxed);

        if self.fail_upserts_for.lock().unwrap().contains(&input.id) {
            return Err(VisitLogError::Remote(format!(
                "upsert rejected for record {}",
                input.id
            )));
        }

        let stamped = self.next_timestamp();
        let record = VisitRecordRemote {
            id: input.id.clone(),
            activity_id: input.activity_id.clone(),
            activity_name: input.activity_name.clone(),
            date: input.date.clone(),
            memo: input.memo.clone(),
            photo_path: input.photo_path.clone(),
            source: input.source,
            created_at: stamped.clone(),
            updated_at: stamped,
        };

        self.records
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn remove(&self, user_id: &str, record_id: &str) -> Result<()> {
        if let Some(by_id) = self.records.lock().unwrap().get_mut(user_id) {
            by_id.remove(record_id);
        }
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.records.lock().unwrap().remove(user_id);
        Ok(())
    }
}

/// In-memory photo blob store.
#[derive(Default)]
pub struct MemoryPhotoClient {
    blobs: Mutex<HashMap<String, String>>,
    fail_uploads: AtomicBool,
    fail_deletes_for: Mutex<HashSet<String>>,
}

impl MemoryPhotoClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::Relaxed);
    }

    pub fn fail_deletes_for(&self, photo_path: &str) {
        self.fail_deletes_for
            .lock()
            .unwrap()
            .insert(photo_path.to_string());
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn has_blob(&self, photo_path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(photo_path)
    }
}

#[async_trait]
impl PhotoClient for MemoryPhotoClient {
    async fn upload(&self, user_id: &str, record_id: &str, data_url: &str) -> Result<String> {
        if !is_data_url(data_url) {
            return Err(VisitLogError::InvalidPhoto);
        }
        if self.fail_uploads.load(Ordering::Relaxed) {
            return Err(VisitLogError::Remote("photo upload rejected".to_string()));
        }

        let path = visit_photo_path(user_id, record_id);
        self.blobs
            .lock()
            .unwrap()
            .insert(path.clone(), data_url.to_string());
        Ok(path)
    }

    async fn delete(&self, photo_path: Option<&str>) -> Result<()> {
        let Some(path) = photo_path else {
            return Ok(());
        };
        if self.fail_deletes_for.lock().unwrap().contains(path) {
            return Err(VisitLogError::Remote(format!(
                "blob delete rejected for {}",
                path
            )));
        }

        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }
}

/// In-memory migration status documents keyed by user.
#[derive(Default)]
pub struct MemoryMigrationStatusStore {
    statuses: Mutex<HashMap<String, MigrationStatus>>,
}

impl MemoryMigrationStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MigrationStatusStore for MemoryMigrationStatusStore {
    async fn load(&self, user_id: &str) -> Result<Option<MigrationStatus>> {
        Ok(self.statuses.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert(&self, user_id: &str, status: &MigrationStatus) -> Result<()> {
        self.statuses
            .lock()
            .unwrap()
            .insert(user_id.to_string(), status.clone());
        Ok(())
    }
}
