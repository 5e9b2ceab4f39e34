// Remote repository - translates local records to the remote shape at this
// boundary and resolves photo references against the blob store

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{Photo, RecordSource, UpsertVisitRecord, VisitRecord};
use crate::remote::{PhotoClient, VisitRecordClient};
use crate::repository::VisitHistoryRepository;

pub struct RemoteVisitHistoryRepository {
    records: Arc<dyn VisitRecordClient>,
    photos: Arc<dyn PhotoClient>,
}

impl RemoteVisitHistoryRepository {
    pub fn new(records: Arc<dyn VisitRecordClient>, photos: Arc<dyn PhotoClient>) -> Self {
        RemoteVisitHistoryRepository { records, photos }
    }

    /// Inline photo data is uploaded to obtain a blob path; an existing path
    /// passes through untouched. Remote records never carry inline bytes.
    async fn resolve_photo_path(
        &self,
        user_id: &str,
        record: &VisitRecord,
    ) -> Result<Option<String>> {
        match &record.photo {
            None => Ok(None),
            Some(Photo::Inline(data_url)) => {
                let path = self.photos.upload(user_id, &record.id, data_url).await?;
                Ok(Some(path))
            }
            Some(Photo::Stored(path)) => Ok(Some(path.clone())),
        }
    }

    async fn load_records(&self, user_id: &str) -> Result<Vec<VisitRecord>> {
        let records = self.records.load(user_id).await?;
        Ok(records.into_iter().map(|r| r.into_local()).collect())
    }
}

#[async_trait]
impl VisitHistoryRepository for RemoteVisitHistoryRepository {
    async fn load(&self, user_id: &str) -> Result<Vec<VisitRecord>> {
        self.load_records(user_id).await
    }

    async fn save_all(&self, user_id: &str, records: &[VisitRecord]) -> Result<Vec<VisitRecord>> {
        self.records.clear(user_id).await?;

        for record in records {
            let photo_path = self.resolve_photo_path(user_id, record).await?;
            let input = UpsertVisitRecord::from_record(record, photo_path, RecordSource::App);
            self.records.upsert(user_id, &input).await?;
        }

        self.load_records(user_id).await
    }

    async fn append(&self, user_id: &str, record: &VisitRecord) -> Result<Vec<VisitRecord>> {
        let photo_path = self.resolve_photo_path(user_id, record).await?;
        let input = UpsertVisitRecord::from_record(record, photo_path, RecordSource::App);
        self.records.upsert(user_id, &input).await?;
        self.load_records(user_id).await
    }

    async fn remove(&self, user_id: &str, record_id: &str) -> Result<Vec<VisitRecord>> {
        let existing = self.records.load(user_id).await?;
        let photo_path = existing
            .iter()
            .find(|record| record.id == record_id)
            .and_then(|record| record.photo_path.clone());

        self.records.remove(user_id, record_id).await?;

        // Best-effort orphan cleanup; the record delete already happened.
        if let Err(e) = self.photos.delete(photo_path.as_deref()).await {
            log::warn!("Orphaned photo delete failed for record {}: {}", record_id, e);
        }

        self.load_records(user_id).await
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        let existing = self.records.load(user_id).await?;

        // Delete blobs independently, continuing past individual failures.
        for record in &existing {
            if let Err(e) = self.photos.delete(record.photo_path.as_deref()).await {
                log::warn!("Photo delete failed for record {}: {}", record.id, e);
            }
        }

        self.records.clear(user_id).await
    }
}
