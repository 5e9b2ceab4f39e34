// Migration status tracker
// The status document is the only shared mutable resource in the migration
// path. It is mutated exclusively through begin_attempt/finalize_attempt,
// each a single read-then-write. No optimistic-concurrency token is used, so
// two simultaneous runs for one user could race; single-writer per user is
// assumed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::MAX_MIGRATION_ATTEMPTS;
use crate::error::Result;
use crate::migration::{MigrationFailureItem, MigrationState, MigrationStatus};

/// Persistence of the per-user status document.
#[async_trait]
pub trait MigrationStatusStore: Send + Sync {
    /// Load the stored status, or None when the user has none yet.
    async fn load(&self, user_id: &str) -> Result<Option<MigrationStatus>>;

    async fn upsert(&self, user_id: &str, status: &MigrationStatus) -> Result<()>;
}

/// State-machine operations over the status document.
pub struct MigrationStatusService {
    store: Arc<dyn MigrationStatusStore>,
}

impl MigrationStatusService {
    pub fn new(store: Arc<dyn MigrationStatusStore>) -> Self {
        MigrationStatusService { store }
    }

    /// Current status, defaulting to a fresh idle status when none exists.
    pub async fn get(&self, user_id: &str) -> Result<MigrationStatus> {
        Ok(self
            .store
            .load(user_id)
            .await?
            .unwrap_or_else(MigrationStatus::initial))
    }

    /// Record the start of an attempt: bump the attempt counter, move to
    /// running, stamp `last_attempt_at`.
    pub async fn begin_attempt(&self, user_id: &str, now: &str) -> Result<MigrationStatus> {
        let current = self.get(user_id).await?;
        let next = MigrationStatus {
            state: MigrationState::Running,
            attempts: current.attempts + 1,
            last_attempt_at: Some(now.to_string()),
            ..current
        };

        self.store.upsert(user_id, &next).await?;
        Ok(next)
    }

    /// Record the outcome of an attempt. No failures completes the migration;
    /// otherwise the attempt count decides between partial and failed.
    pub async fn finalize_attempt(
        &self,
        user_id: &str,
        failed_items: Vec<MigrationFailureItem>,
        now: &str,
    ) -> Result<MigrationStatus> {
        let current = self.get(user_id).await?;

        let state = if failed_items.is_empty() {
            MigrationState::Completed
        } else if current.attempts >= MAX_MIGRATION_ATTEMPTS {
            MigrationState::Failed
        } else {
            MigrationState::Partial
        };

        let next = MigrationStatus {
            state,
            completed_at: if state == MigrationState::Completed {
                Some(now.to_string())
            } else {
                None
            },
            failed_items,
            ..current
        };

        self.store.upsert(user_id, &next).await?;
        Ok(next)
    }

    /// True once retries are exhausted and the migration must never re-run.
    pub fn should_stop_retry(&self, status: &MigrationStatus) -> bool {
        status.state == MigrationState::Failed && status.attempts >= MAX_MIGRATION_ATTEMPTS
    }
}
