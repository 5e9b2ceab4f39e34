// Repository module
// One contract over the visit history with three backends: local-only,
// remote-only, and hybrid (write-through-local with best-effort remote
// mirroring). The storage mode is injected; nothing here reads configuration.

pub mod hybrid;
pub mod local;
pub mod remote;

#[cfg(test)]
mod tests;

pub use hybrid::HybridVisitHistoryRepository;
pub use local::LocalVisitHistoryRepository;
pub use remote::RemoteVisitHistoryRepository;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StorageMode;
use crate::error::Result;
use crate::record::VisitRecord;
use crate::remote::{PhotoClient, VisitRecordClient};
use crate::store::LocalStore;

/// Unified read/write access to a user's visit history.
/// Every write returns the resulting canonical record list.
#[async_trait]
pub trait VisitHistoryRepository: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Vec<VisitRecord>>;

    async fn save_all(&self, user_id: &str, records: &[VisitRecord]) -> Result<Vec<VisitRecord>>;

    async fn append(&self, user_id: &str, record: &VisitRecord) -> Result<Vec<VisitRecord>>;

    async fn remove(&self, user_id: &str, record_id: &str) -> Result<Vec<VisitRecord>>;

    async fn clear(&self, user_id: &str) -> Result<()>;
}

/// Build the repository variant for the given storage mode.
pub fn create_repository(
    mode: StorageMode,
    store: Arc<LocalStore>,
    records: Arc<dyn VisitRecordClient>,
    photos: Arc<dyn PhotoClient>,
) -> Arc<dyn VisitHistoryRepository> {
    let local = Arc::new(LocalVisitHistoryRepository::new(store));
    if mode == StorageMode::Local {
        return local;
    }

    let remote = Arc::new(RemoteVisitHistoryRepository::new(records, photos));
    if mode == StorageMode::Remote {
        return remote;
    }

    Arc::new(HybridVisitHistoryRepository::new(local, remote))
}
