// Migration runner - performs one best-effort migration attempt per call

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::migration::status::MigrationStatusService;
use crate::migration::{MigrationFailureItem, MigrationState, MigrationStatus};
use crate::record::{Photo, RecordSource, UpsertVisitRecord, VisitRecord};
use crate::remote::{PhotoClient, VisitRecordClient};
use crate::store::LocalStore;

/// Collaborators for a migration run. The clock is injectable so tests get
/// deterministic timestamps.
pub struct MigrationDeps {
    pub status: MigrationStatusService,
    pub records: Arc<dyn VisitRecordClient>,
    pub photos: Arc<dyn PhotoClient>,
    pub local: Arc<LocalStore>,
    now: Box<dyn Fn() -> String + Send + Sync>,
}

impl MigrationDeps {
    pub fn new(
        status: MigrationStatusService,
        records: Arc<dyn VisitRecordClient>,
        photos: Arc<dyn PhotoClient>,
        local: Arc<LocalStore>,
    ) -> Self {
        MigrationDeps {
            status,
            records,
            photos,
            local,
            now: Box::new(|| Utc::now().to_rfc3339()),
        }
    }

    pub fn with_clock(mut self, now: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.now = Box::new(now);
        self
    }
}

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRunResult {
    pub migrated_count: usize,
    pub failed_count: usize,
    /// True when the run was skipped without touching the remote store.
    pub skipped: bool,
    /// True only when retries are exhausted and the user should hear about it.
    pub should_notify: bool,
    pub status: MigrationStatus,
}

/// Run the visit-history migration for a user unless it is already completed
/// or permanently failed.
///
/// Records are processed strictly sequentially; a failure on one record is
/// recorded and the batch continues. Photo uploads happen before the record
/// upsert so the remote record always references an existing blob.
pub async fn run_migration_if_needed(
    user_id: &str,
    deps: &MigrationDeps,
) -> Result<MigrationRunResult> {
    let existing = deps.status.get(user_id).await?;

    if existing.state == MigrationState::Completed {
        return Ok(MigrationRunResult {
            migrated_count: 0,
            failed_count: 0,
            skipped: true,
            should_notify: false,
            status: existing,
        });
    }

    if deps.status.should_stop_retry(&existing) {
        return Ok(MigrationRunResult {
            migrated_count: 0,
            failed_count: existing.failed_items.len(),
            skipped: true,
            should_notify: true,
            status: existing,
        });
    }

    let started_at = (deps.now)();
    let running = deps.status.begin_attempt(user_id, &started_at).await?;
    let local_records = deps.local.load_visit_history();

    log::info!(
        "Migration attempt {} for user {}: {} local records",
        running.attempts,
        user_id,
        local_records.len()
    );

    let mut migrated_count = 0;
    let mut failed_items: Vec<MigrationFailureItem> = Vec::new();

    for record in &local_records {
        let outcome = migrate_record(user_id, deps, record).await;
        match outcome {
            Ok(()) => migrated_count += 1,
            Err(e) => {
                log::warn!("Migration of record {} failed: {}", record.id, e);
                failed_items.push(MigrationFailureItem {
                    record_id: record.id.clone(),
                    reason: e.to_string(),
                    occurred_at: (deps.now)(),
                });
            }
        }
    }

    let finalized = deps
        .status
        .finalize_attempt(user_id, failed_items.clone(), &(deps.now)())
        .await?;

    Ok(MigrationRunResult {
        migrated_count,
        failed_count: failed_items.len(),
        skipped: false,
        should_notify: finalized.state == MigrationState::Failed
            && finalized.attempts >= running.attempts,
        status: finalized,
    })
}

/// Upload the record's inline photo (if any) and upsert the remote record
/// tagged as migrated.
async fn migrate_record(
    user_id: &str,
    deps: &MigrationDeps,
    record: &VisitRecord,
) -> Result<()> {
    let photo_path = match &record.photo {
        Some(Photo::Inline(data_url)) => {
            Some(deps.photos.upload(user_id, &record.id, data_url).await?)
        }
        _ => None,
    };

    let input = UpsertVisitRecord::from_record(record, photo_path, RecordSource::Migrated);
    deps.records.upsert(user_id, &input).await
}
