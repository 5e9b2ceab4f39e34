// Repository scenario tests across the three storage variants.

use std::sync::Arc;

use crate::config::StorageMode;
use crate::record::{Photo, VisitRecord};
use crate::remote::memory::{MemoryPhotoClient, MemoryVisitRecordClient};
use crate::remote::VisitRecordClient;
use crate::repository::{
    create_repository, HybridVisitHistoryRepository, LocalVisitHistoryRepository,
    RemoteVisitHistoryRepository, VisitHistoryRepository,
};
use crate::store::LocalStore;

const USER: &str = "user-1";

fn record(id: &str) -> VisitRecord {
    VisitRecord {
        id: id.to_string(),
        activity_id: format!("act-{}", id),
        activity_name: "Playground".to_string(),
        date: "2024. 5. 1.".to_string(),
        memo: "memo".to_string(),
        photo: None,
    }
}

fn record_with_photo(id: &str) -> VisitRecord {
    let mut r = record(id);
    r.photo = Some(Photo::Inline("data:image/jpeg;base64,aGVsbG8=".to_string()));
    r
}

struct Fixture {
    store: Arc<LocalStore>,
    records: Arc<MemoryVisitRecordClient>,
    photos: Arc<MemoryPhotoClient>,
}

fn fixture() -> Fixture {
    Fixture {
        store: Arc::new(LocalStore::open_in_memory().unwrap()),
        records: Arc::new(MemoryVisitRecordClient::new()),
        photos: Arc::new(MemoryPhotoClient::new()),
    }
}

fn remote_repo(f: &Fixture) -> RemoteVisitHistoryRepository {
    RemoteVisitHistoryRepository::new(f.records.clone(), f.photos.clone())
}

fn hybrid_repo(f: &Fixture) -> HybridVisitHistoryRepository {
    HybridVisitHistoryRepository::new(
        Arc::new(LocalVisitHistoryRepository::new(f.store.clone())),
        Arc::new(remote_repo(f)),
    )
}

#[tokio::test]
async fn test_local_append_prepends_newest_first() {
    let f = fixture();
    let repo = LocalVisitHistoryRepository::new(f.store.clone());

    repo.append(USER, &record("r1")).await.unwrap();
    let list = repo.append(USER, &record("r2")).await.unwrap();

    let ids: Vec<&str> = list.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r1"]);

    let after_remove = repo.remove(USER, "r2").await.unwrap();
    assert_eq!(after_remove.len(), 1);
    assert_eq!(after_remove[0].id, "r1");
}

#[tokio::test]
async fn test_remote_append_uploads_inline_photo() {
    let f = fixture();
    let repo = remote_repo(&f);

    let list = repo.append(USER, &record_with_photo("r1")).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(
        list[0].photo,
        Some(Photo::Stored("users/user-1/visit-photos/r1.jpg".to_string())),
        "remote round-trip must come back as a stored path, never inline data"
    );
    assert!(f.photos.has_blob("users/user-1/visit-photos/r1.jpg"));
}

#[tokio::test]
async fn test_remote_append_passes_existing_path_through() {
    let f = fixture();
    let repo = remote_repo(&f);

    let mut r = record("r1");
    r.photo = Some(Photo::Stored("users/user-1/visit-photos/r1.jpg".to_string()));

    let list = repo.append(USER, &r).await.unwrap();
    assert_eq!(
        list[0].photo,
        Some(Photo::Stored("users/user-1/visit-photos/r1.jpg".to_string()))
    );
    // Nothing was uploaded for an already-stored photo
    assert_eq!(f.photos.blob_count(), 0);
}

#[tokio::test]
async fn test_remote_save_all_replaces_collection() {
    let f = fixture();
    let repo = remote_repo(&f);

    repo.append(USER, &record("old")).await.unwrap();
    let list = repo
        .save_all(USER, &[record("r1"), record("r2")])
        .await
        .unwrap();

    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|r| r.id != "old"));
}

#[tokio::test]
async fn test_remote_remove_deletes_photo_best_effort() {
    let f = fixture();
    let repo = remote_repo(&f);

    repo.append(USER, &record_with_photo("r1")).await.unwrap();
    assert!(f.photos.has_blob("users/user-1/visit-photos/r1.jpg"));

    // Even when the blob delete is rejected, remove must still succeed.
    f.photos.fail_deletes_for("users/user-1/visit-photos/r1.jpg");
    let list = repo.remove(USER, "r1").await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_remote_clear_continues_past_blob_failures() {
    let f = fixture();
    let repo = remote_repo(&f);

    repo.append(USER, &record_with_photo("r1")).await.unwrap();
    repo.append(USER, &record_with_photo("r2")).await.unwrap();
    f.photos.fail_deletes_for("users/user-1/visit-photos/r1.jpg");

    repo.clear(USER).await.unwrap();

    assert!(repo.load(USER).await.unwrap().is_empty());
    // r2's blob went away; r1's rejected delete left it behind
    assert!(!f.photos.has_blob("users/user-1/visit-photos/r2.jpg"));
    assert!(f.photos.has_blob("users/user-1/visit-photos/r1.jpg"));
}

#[tokio::test]
async fn test_hybrid_append_survives_remote_failure() {
    let f = fixture();
    let repo = hybrid_repo(&f);

    f.records.fail_upserts_for("r1");
    let list = repo.append(USER, &record("r1")).await.unwrap();

    assert_eq!(list.len(), 1, "local write must win even when the mirror throws");
    assert_eq!(f.store.load_visit_history().len(), 1);
    assert!(f.records.load(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hybrid_load_reads_local_only() {
    let f = fixture();
    let repo = hybrid_repo(&f);

    // Seed the remote with a record the local store does not have
    remote_repo(&f).append(USER, &record("remote-only")).await.unwrap();
    f.store.save_visit_history(&[record("local-only")]);

    let list = repo.load(USER).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "local-only");
}

#[tokio::test]
async fn test_hybrid_mirrors_writes_when_remote_healthy() {
    let f = fixture();
    let repo = hybrid_repo(&f);

    repo.append(USER, &record("r1")).await.unwrap();

    let mirrored = f.records.load(USER).await.unwrap();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].id, "r1");
}

#[tokio::test]
async fn test_factory_selects_variant_by_mode() {
    let f = fixture();
    let repo = create_repository(
        StorageMode::Local,
        f.store.clone(),
        f.records.clone(),
        f.photos.clone(),
    );

    repo.append(USER, &record("r1")).await.unwrap();
    // Local mode never touches the remote collection
    assert_eq!(f.records.upsert_calls(), 0);

    let f = fixture();
    let repo = create_repository(
        StorageMode::Hybrid,
        f.store.clone(),
        f.records.clone(),
        f.photos.clone(),
    );
    repo.append(USER, &record("r1")).await.unwrap();
    assert_eq!(f.records.upsert_calls(), 1);
    assert_eq!(f.store.load_visit_history().len(), 1);

    let f = fixture();
    let repo = create_repository(
        StorageMode::Remote,
        f.store.clone(),
        f.records.clone(),
        f.photos.clone(),
    );
    repo.append(USER, &record("r1")).await.unwrap();
    assert_eq!(f.records.upsert_calls(), 1);
    assert!(f.store.load_visit_history().is_empty());
}
