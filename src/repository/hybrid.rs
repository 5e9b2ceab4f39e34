// Hybrid repository - local writes are authoritative and returned to the
// caller; the same operation is then mirrored to the remote repository with
// any failure caught and logged at this boundary, never surfaced

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::VisitRecord;
use crate::repository::VisitHistoryRepository;

pub struct HybridVisitHistoryRepository {
    local: Arc<dyn VisitHistoryRepository>,
    remote: Arc<dyn VisitHistoryRepository>,
}

impl HybridVisitHistoryRepository {
    pub fn new(
        local: Arc<dyn VisitHistoryRepository>,
        remote: Arc<dyn VisitHistoryRepository>,
    ) -> Self {
        HybridVisitHistoryRepository { local, remote }
    }
}

/// Await the mirrored remote operation and swallow its outcome. Mirroring is
/// best-effort: the caller already holds the authoritative local result.
async fn mirror<T, F>(operation_name: &str, operation: F)
where
    F: Future<Output = Result<T>>,
{
    if let Err(e) = operation.await {
        log::error!("Hybrid repository remote {} failed: {}", operation_name, e);
    }
}

#[async_trait]
impl VisitHistoryRepository for HybridVisitHistoryRepository {
    /// Reads are local-only; local is authoritative.
    async fn load(&self, user_id: &str) -> Result<Vec<VisitRecord>> {
        self.local.load(user_id).await
    }

    async fn save_all(&self, user_id: &str, records: &[VisitRecord]) -> Result<Vec<VisitRecord>> {
        let local_result = self.local.save_all(user_id, records).await?;
        mirror("save_all", self.remote.save_all(user_id, &local_result)).await;
        Ok(local_result)
    }

    async fn append(&self, user_id: &str, record: &VisitRecord) -> Result<Vec<VisitRecord>> {
        let local_result = self.local.append(user_id, record).await?;
        mirror("append", self.remote.append(user_id, record)).await;
        Ok(local_result)
    }

    async fn remove(&self, user_id: &str, record_id: &str) -> Result<Vec<VisitRecord>> {
        let local_result = self.local.remove(user_id, record_id).await?;
        mirror("remove", self.remote.remove(user_id, record_id)).await;
        Ok(local_result)
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.local.clear(user_id).await?;
        mirror("clear", self.remote.clear(user_id)).await;
        Ok(())
    }
}
