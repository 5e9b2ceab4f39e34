// HTTP remote store clients
// REST layout:
//   GET/DELETE  {base}/users/{userId}/visitRecords
//   PUT/DELETE  {base}/users/{userId}/visitRecords/{recordId}
//   GET/PUT     {base}/users/{userId}/migrationStatus/{version}
//   PUT/DELETE  {base}/blobs/{photoPath}

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;

use crate::constants::{MIGRATION_VERSION, PHOTO_CONTENT_TYPE};
use crate::error::{Result, VisitLogError};
use crate::migration::{normalize_migration_status, MigrationStatus, MigrationStatusStore};
use crate::record::{
    is_data_url, normalize_remote_record, UpsertVisitRecord, VisitRecordRemote,
};
use crate::remote::{visit_photo_path, PhotoClient, VisitRecordClient};

/// Visit-record collection over the document-store REST API.
pub struct HttpVisitRecordClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVisitRecordClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        HttpVisitRecordClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/visitRecords", self.base_url, user_id)
    }

    fn record_url(&self, user_id: &str, record_id: &str) -> String {
        format!("{}/{}", self.collection_url(user_id), record_id)
    }
}

#[async_trait]
impl VisitRecordClient for HttpVisitRecordClient {
    async fn load(&self, user_id: &str) -> Result<Vec<VisitRecordRemote>> {
        let documents: Vec<serde_json::Value> = self
            .client
            .get(self.collection_url(user_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut records: Vec<VisitRecordRemote> = documents
            .iter()
            .filter_map(|doc| {
                let id = doc.get("id").and_then(|v| v.as_str())?;
                Some(normalize_remote_record(id, doc))
            })
            .collect();

        // RFC 3339 strings sort lexicographically; newest first.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn upsert(&self, user_id: &str, input: &UpsertVisitRecord) -> Result<()> {
        self.client
            .put(self.record_url(user_id, &input.id))
            .json(input)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn remove(&self, user_id: &str, record_id: &str) -> Result<()> {
        self.client
            .delete(self.record_url(user_id, record_id))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.client
            .delete(self.collection_url(user_id))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Photo blob store over the REST API.
pub struct HttpPhotoClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPhotoClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        HttpPhotoClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn blob_url(&self, photo_path: &str) -> String {
        format!("{}/blobs/{}", self.base_url, photo_path)
    }
}

#[async_trait]
impl PhotoClient for HttpPhotoClient {
    async fn upload(&self, user_id: &str, record_id: &str, data_url: &str) -> Result<String> {
        if !is_data_url(data_url) {
            return Err(VisitLogError::InvalidPhoto);
        }

        // The payload after the base64 marker is the actual image.
        let encoded = data_url
            .split_once("base64,")
            .map(|(_, rest)| rest)
            .ok_or(VisitLogError::InvalidPhoto)?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|_| VisitLogError::InvalidPhoto)?;

        let path = visit_photo_path(user_id, record_id);
        self.client
            .put(self.blob_url(&path))
            .header(reqwest::header::CONTENT_TYPE, PHOTO_CONTENT_TYPE)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        Ok(path)
    }

    async fn delete(&self, photo_path: Option<&str>) -> Result<()> {
        let Some(path) = photo_path else {
            return Ok(());
        };

        self.client
            .delete(self.blob_url(path))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Migration status document over the REST API.
pub struct HttpMigrationStatusStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMigrationStatusStore {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        HttpMigrationStatusStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn status_url(&self, user_id: &str) -> String {
        format!(
            "{}/users/{}/migrationStatus/{}",
            self.base_url, user_id, MIGRATION_VERSION
        )
    }
}

#[async_trait]
impl MigrationStatusStore for HttpMigrationStatusStore {
    async fn load(&self, user_id: &str) -> Result<Option<MigrationStatus>> {
        let response = self.client.get(self.status_url(user_id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: serde_json::Value = response.error_for_status()?.json().await?;
        Ok(Some(normalize_migration_status(&document)))
    }

    async fn upsert(&self, user_id: &str, status: &MigrationStatus) -> Result<()> {
        self.client
            .put(self.status_url(user_id))
            .json(status)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
