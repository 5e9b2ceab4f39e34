// Migration scenario tests covering the retry state machine end to end.

use std::sync::Arc;

use crate::constants::{MAX_MIGRATION_ATTEMPTS, MIGRATION_VERSION};
use crate::migration::status::MigrationStatusService;
use crate::migration::{
    normalize_migration_status, run_migration_if_needed, MigrationDeps, MigrationFailureItem,
    MigrationState, MigrationStatus,
};
use crate::record::{Photo, RecordSource, VisitRecord};
use crate::remote::memory::{
    MemoryMigrationStatusStore, MemoryPhotoClient, MemoryVisitRecordClient,
};
use crate::remote::VisitRecordClient;
use crate::store::LocalStore;

const USER: &str = "user-1";
const NOW: &str = "2024-06-01T09:00:00Z";

fn record(id: &str) -> VisitRecord {
    VisitRecord {
        id: id.to_string(),
        activity_id: format!("act-{}", id),
        activity_name: "Aquarium".to_string(),
        date: "2024. 5. 1.".to_string(),
        memo: "memo".to_string(),
        photo: None,
    }
}

struct Fixture {
    records: Arc<MemoryVisitRecordClient>,
    photos: Arc<MemoryPhotoClient>,
    local: Arc<LocalStore>,
    status_store: Arc<MemoryMigrationStatusStore>,
}

impl Fixture {
    fn new(local_records: &[VisitRecord]) -> Self {
        let local = Arc::new(LocalStore::open_in_memory().unwrap());
        local.save_visit_history(local_records);
        Fixture {
            records: Arc::new(MemoryVisitRecordClient::new()),
            photos: Arc::new(MemoryPhotoClient::new()),
            local,
            status_store: Arc::new(MemoryMigrationStatusStore::new()),
        }
    }

    fn deps(&self) -> MigrationDeps {
        MigrationDeps::new(
            MigrationStatusService::new(self.status_store.clone()),
            self.records.clone(),
            self.photos.clone(),
            self.local.clone(),
        )
        .with_clock(|| NOW.to_string())
    }

    fn service(&self) -> MigrationStatusService {
        MigrationStatusService::new(self.status_store.clone())
    }
}

// ---------------------------------------------------------------
// Status tracker
// ---------------------------------------------------------------

#[tokio::test]
async fn test_get_defaults_to_initial_status() {
    let f = Fixture::new(&[]);
    let status = f.service().get(USER).await.unwrap();
    assert_eq!(status, MigrationStatus::initial());
    assert_eq!(status.version, MIGRATION_VERSION);
}

#[tokio::test]
async fn test_begin_attempt_increments_attempts_each_time() {
    let f = Fixture::new(&[]);
    let service = f.service();

    for expected in 1..=5u32 {
        let status = service.begin_attempt(USER, NOW).await.unwrap();
        assert_eq!(status.attempts, expected);
        assert_eq!(status.state, MigrationState::Running);
        assert_eq!(status.last_attempt_at.as_deref(), Some(NOW));
    }
}

#[tokio::test]
async fn test_finalize_with_no_failures_always_completes() {
    let f = Fixture::new(&[]);
    let service = f.service();

    // Even after many attempts, an empty failure list completes the migration.
    for _ in 0..4 {
        service.begin_attempt(USER, NOW).await.unwrap();
    }
    let status = service.finalize_attempt(USER, Vec::new(), NOW).await.unwrap();

    assert_eq!(status.state, MigrationState::Completed);
    assert_eq!(status.completed_at.as_deref(), Some(NOW));
    assert!(status.failed_items.is_empty());
}

#[tokio::test]
async fn test_finalize_with_failures_is_partial_until_attempts_exhausted() {
    let f = Fixture::new(&[]);
    let service = f.service();
    let failure = MigrationFailureItem {
        record_id: "r1".to_string(),
        reason: "boom".to_string(),
        occurred_at: NOW.to_string(),
    };

    service.begin_attempt(USER, NOW).await.unwrap();
    let partial = service
        .finalize_attempt(USER, vec![failure.clone()], NOW)
        .await
        .unwrap();
    assert_eq!(partial.state, MigrationState::Partial);
    assert!(!service.should_stop_retry(&partial));

    service.begin_attempt(USER, NOW).await.unwrap();
    service.begin_attempt(USER, NOW).await.unwrap();
    let failed = service
        .finalize_attempt(USER, vec![failure], NOW)
        .await
        .unwrap();
    assert_eq!(failed.attempts, MAX_MIGRATION_ATTEMPTS);
    assert_eq!(failed.state, MigrationState::Failed);
    assert!(service.should_stop_retry(&failed));
}

#[test]
fn test_normalize_migration_status_discards_malformed_fields() {
    let value = serde_json::json!({
        "version": "somethingElse",
        "state": "exploded",
        "attempts": -4,
        "lastAttemptAt": 17,
        "completedAt": null,
        "failedItems": [
            {"recordId": "r1", "reason": "boom", "occurredAt": "t"},
            {"recordId": 2, "reason": "boom", "occurredAt": "t"},
            "garbage"
        ]
    });

    let status = normalize_migration_status(&value);
    assert_eq!(status.version, MIGRATION_VERSION);
    assert_eq!(status.state, MigrationState::Idle);
    assert_eq!(status.attempts, 0);
    assert_eq!(status.last_attempt_at, None);
    assert_eq!(status.completed_at, None);
    assert_eq!(status.failed_items.len(), 1);
    assert_eq!(status.failed_items[0].record_id, "r1");
}

#[test]
fn test_normalize_migration_status_keeps_valid_fields() {
    let value = serde_json::json!({
        "state": "partial",
        "attempts": 2.9,
        "lastAttemptAt": "2024-06-01T09:00:00Z",
        "failedItems": []
    });

    let status = normalize_migration_status(&value);
    assert_eq!(status.state, MigrationState::Partial);
    assert_eq!(status.attempts, 2, "fractional attempts floor");
    assert_eq!(status.last_attempt_at.as_deref(), Some("2024-06-01T09:00:00Z"));

    assert_eq!(
        normalize_migration_status(&serde_json::json!("not an object")),
        MigrationStatus::initial()
    );
}

// ---------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------

#[tokio::test]
async fn test_run_migrates_all_records_and_completes() {
    let mut with_photo = record("r1");
    with_photo.photo = Some(Photo::Inline("data:image/jpeg;base64,aGk=".to_string()));
    let f = Fixture::new(&[with_photo, record("r2")]);

    let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();

    assert_eq!(result.migrated_count, 2);
    assert_eq!(result.failed_count, 0);
    assert!(!result.skipped);
    assert!(!result.should_notify);
    assert_eq!(result.status.state, MigrationState::Completed);
    assert_eq!(result.status.attempts, 1);

    let remote = f.records.load(USER).await.unwrap();
    assert_eq!(remote.len(), 2);
    assert!(remote.iter().all(|r| r.source == RecordSource::Migrated));

    let migrated_r1 = remote.iter().find(|r| r.id == "r1").unwrap();
    assert_eq!(
        migrated_r1.photo_path.as_deref(),
        Some("users/user-1/visit-photos/r1.jpg")
    );
    assert!(f.photos.has_blob("users/user-1/visit-photos/r1.jpg"));
}

#[tokio::test]
async fn test_run_records_per_item_failure_and_continues() {
    let mut with_photo = record("r1");
    with_photo.photo = Some(Photo::Inline("data:image/jpeg;base64,aGk=".to_string()));
    let f = Fixture::new(&[with_photo, record("r2")]);
    f.records.fail_upserts_for("r2");

    let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();

    assert_eq!(result.migrated_count, 1);
    assert_eq!(result.failed_count, 1);
    assert!(!result.should_notify, "partial failures stay quiet before retries run out");
    assert_eq!(result.status.state, MigrationState::Partial);
    assert_eq!(result.status.failed_items.len(), 1);
    assert_eq!(result.status.failed_items[0].record_id, "r2");
    assert_eq!(result.status.failed_items[0].occurred_at, NOW);
}

#[tokio::test]
async fn test_run_converts_photo_upload_failure_into_item_failure() {
    let mut with_photo = record("r1");
    with_photo.photo = Some(Photo::Inline("data:image/jpeg;base64,aGk=".to_string()));
    let f = Fixture::new(&[with_photo, record("r2")]);
    f.photos.fail_uploads(true);

    let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();

    // r1's photo upload failed before its upsert; r2 still migrated
    assert_eq!(result.migrated_count, 1);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.status.failed_items[0].record_id, "r1");
    assert_eq!(f.records.load(USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_run_skips_once_completed() {
    let f = Fixture::new(&[record("r1")]);
    run_migration_if_needed(USER, &f.deps()).await.unwrap();
    let calls_after_first = f.records.upsert_calls();

    let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();

    assert!(result.skipped);
    assert!(!result.should_notify);
    assert_eq!(result.migrated_count, 0);
    assert_eq!(result.failed_count, 0);
    assert_eq!(result.status.state, MigrationState::Completed);
    assert_eq!(f.records.upsert_calls(), calls_after_first, "no remote writes on skip");
}

#[tokio::test]
async fn test_run_stops_permanently_after_exhausted_retries() {
    let f = Fixture::new(&[record("r1")]);
    f.records.fail_upserts_for("r1");

    for attempt in 1..=MAX_MIGRATION_ATTEMPTS {
        let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();
        assert!(!result.skipped);
        assert_eq!(result.status.attempts, attempt);
        if attempt < MAX_MIGRATION_ATTEMPTS {
            assert_eq!(result.status.state, MigrationState::Partial);
            assert!(!result.should_notify);
        } else {
            assert_eq!(result.status.state, MigrationState::Failed);
            assert!(result.should_notify, "notify exactly when retries run out");
        }
    }

    // A fourth run never touches the remote store again.
    let calls_before = f.records.upsert_calls();
    let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();
    assert!(result.skipped);
    assert!(result.should_notify);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.status.attempts, MAX_MIGRATION_ATTEMPTS);
    assert_eq!(f.records.upsert_calls(), calls_before);
}

#[tokio::test]
async fn test_run_with_empty_local_history_completes() {
    let f = Fixture::new(&[]);
    let result = run_migration_if_needed(USER, &f.deps()).await.unwrap();

    assert_eq!(result.migrated_count, 0);
    assert_eq!(result.status.state, MigrationState::Completed);
}
