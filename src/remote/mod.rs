// Remote store clients
// Narrow async interfaces over the per-user visit-record collection, the
// migration-status document, and the photo blob store. HTTP implementations
// live in `http`, in-memory test doubles in `memory`.

pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::constants::PHOTO_EXTENSION;
use crate::error::Result;
use crate::record::{UpsertVisitRecord, VisitRecordRemote};

/// CRUD over a user's remote visit-record collection.
#[async_trait]
pub trait VisitRecordClient: Send + Sync {
    /// Load all records for the user, newest-first by `createdAt`.
    async fn load(&self, user_id: &str) -> Result<Vec<VisitRecordRemote>>;

    /// Idempotent create-or-replace keyed by `input.id`. The server stamps
    /// `createdAt`/`updatedAt`.
    async fn upsert(&self, user_id: &str, input: &UpsertVisitRecord) -> Result<()>;

    /// Delete the record document. Does not touch the associated photo blob.
    async fn remove(&self, user_id: &str, record_id: &str) -> Result<()>;

    /// Delete every record for the user in one batch.
    async fn clear(&self, user_id: &str) -> Result<()>;
}

/// Upload and deletion of photo blobs.
#[async_trait]
pub trait PhotoClient: Send + Sync {
    /// Upload inline image data and return the resulting blob path.
    /// Fails with `InvalidPhoto` when the input is not an image data URL.
    async fn upload(&self, user_id: &str, record_id: &str, data_url: &str) -> Result<String>;

    /// Delete a blob by path. A missing path is a no-op.
    async fn delete(&self, photo_path: Option<&str>) -> Result<()>;
}

/// Blob path convention for visit photos.
pub fn visit_photo_path(user_id: &str, record_id: &str) -> String {
    format!("users/{}/visit-photos/{}.{}", user_id, record_id, PHOTO_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_photo_path() {
        assert_eq!(
            visit_photo_path("user-1", "rec-9"),
            "users/user-1/visit-photos/rec-9.jpg"
        );
    }
}
