mod common;

use std::path::PathBuf;

use common::contract;
use shortener::domain::entities::DeletionIntent;
use shortener::domain::repositories::{StorageError, UrlStorage};
use shortener::infrastructure::persistence::FileStorage;
use tempfile::TempDir;

async fn fresh_storage() -> (TempDir, FileStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path().join("urls.log")).await.unwrap();
    (dir, storage)
}

fn log_path(dir: &TempDir) -> PathBuf {
    dir.path().join("urls.log")
}

#[tokio::test]
async fn test_insert_and_resolve() {
    let (_dir, storage) = fresh_storage().await;
    contract::insert_and_resolve(&storage).await;
}

#[tokio::test]
async fn test_duplicate_url_conflicts() {
    let (_dir, storage) = fresh_storage().await;
    contract::duplicate_url_conflicts(&storage).await;
}

#[tokio::test]
async fn test_ids_strictly_increase() {
    let (_dir, storage) = fresh_storage().await;
    contract::ids_strictly_increase(&storage).await;
}

#[tokio::test]
async fn test_unknown_lookups_not_found() {
    let (_dir, storage) = fresh_storage().await;
    contract::unknown_lookups_not_found(&storage).await;
}

#[tokio::test]
async fn test_user_without_urls_lists_empty() {
    let (_dir, storage) = fresh_storage().await;
    contract::user_without_urls_lists_empty(&storage).await;
}

#[tokio::test]
async fn test_owner_delete_marks_deleted() {
    let (_dir, storage) = fresh_storage().await;
    contract::owner_delete_marks_deleted(&storage).await;
}

#[tokio::test]
async fn test_foreign_delete_is_ignored() {
    let (_dir, storage) = fresh_storage().await;
    contract::foreign_delete_is_ignored(&storage).await;
}

#[tokio::test]
async fn test_delete_never_reverts() {
    let (_dir, storage) = fresh_storage().await;
    contract::delete_never_reverts(&storage).await;
}

#[tokio::test]
async fn test_mixed_batch_applies_only_owned() {
    let (_dir, storage) = fresh_storage().await;
    contract::mixed_batch_applies_only_owned(&storage).await;
}

#[tokio::test]
async fn test_empty_delete_batch_is_noop() {
    let (_dir, storage) = fresh_storage().await;
    contract::empty_delete_batch_is_noop(&storage).await;
}

#[tokio::test]
async fn test_insert_batch_omits_existing() {
    let (_dir, storage) = fresh_storage().await;
    contract::insert_batch_omits_existing(&storage).await;
}

#[tokio::test]
async fn test_stats_count_urls_and_users() {
    let (_dir, storage) = fresh_storage().await;
    contract::stats_count_urls_and_users(&storage).await;
}

#[tokio::test]
async fn test_ping_and_close() {
    let (_dir, storage) = fresh_storage().await;
    contract::ping_and_close(&storage).await;
}

#[tokio::test]
async fn test_inserts_do_not_allocate_users() {
    let (_dir, storage) = fresh_storage().await;
    contract::inserts_do_not_allocate_users(&storage).await;
}

#[tokio::test]
async fn test_live_insert_for_uncreated_owner_leaves_user_count() {
    let (_dir, storage) = fresh_storage().await;

    storage.insert_url("https://a.example", 50).await.unwrap();

    assert_eq!(storage.stats().await.unwrap().users, 0);
    assert_eq!(storage.create_user().await.unwrap(), 1);
}

#[tokio::test]
async fn test_open_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = log_path(&dir);

    let storage = FileStorage::open(&path).await.unwrap();

    assert!(path.exists());
    assert_eq!(storage.stats().await.unwrap().urls, 0);
    storage.ping().await.unwrap();
}

#[tokio::test]
async fn test_inserts_are_appended_as_lines() {
    let (dir, storage) = fresh_storage().await;

    storage.insert_url("https://a.example", 1).await.unwrap();
    storage.insert_url("https://b.example/x?y=1", 2).await.unwrap();

    let contents = std::fs::read_to_string(log_path(&dir)).unwrap();
    assert_eq!(
        contents,
        "1 1 https://a.example false\n2 2 https://b.example/x?y=1 false\n"
    );
}

#[tokio::test]
async fn test_delete_rewrites_log_and_leaves_no_temp_file() {
    let (dir, storage) = fresh_storage().await;
    let a = storage.insert_url("https://a.example", 1).await.unwrap();
    storage.insert_url("https://b.example", 1).await.unwrap();

    storage
        .delete_batch(&[DeletionIntent::new(a, 1)])
        .await
        .unwrap();

    let contents = std::fs::read_to_string(log_path(&dir)).unwrap();
    assert_eq!(
        contents,
        "1 1 https://a.example true\n2 1 https://b.example false\n"
    );
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[tokio::test]
async fn test_appends_after_rewrite_reach_new_file() {
    let (dir, storage) = fresh_storage().await;
    let a = storage.insert_url("https://a.example", 1).await.unwrap();
    storage
        .delete_batch(&[DeletionIntent::new(a, 1)])
        .await
        .unwrap();

    storage.insert_url("https://b.example", 1).await.unwrap();

    let contents = std::fs::read_to_string(log_path(&dir)).unwrap();
    assert_eq!(
        contents,
        "1 1 https://a.example true\n2 1 https://b.example false\n"
    );
}

#[tokio::test]
async fn test_inserts_after_rewrite_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = log_path(&dir);

    let (deleted, later) = {
        let storage = FileStorage::open(&path).await.unwrap();
        let deleted = storage.insert_url("https://a.example", 1).await.unwrap();
        storage
            .delete_batch(&[DeletionIntent::new(deleted, 1)])
            .await
            .unwrap();
        storage
            .delete_batch(&[DeletionIntent::new(deleted, 1)])
            .await
            .unwrap();
        let later = storage.insert_url("https://b.example", 1).await.unwrap();
        storage.close().await;
        (deleted, later)
    };

    let reopened = FileStorage::open(&path).await.unwrap();

    assert!(matches!(
        reopened.get_url(deleted).await,
        Err(StorageError::Deleted)
    ));
    assert_eq!(reopened.get_url(later).await.unwrap(), "https://b.example");
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = log_path(&dir);

    let (kept, deleted) = {
        let storage = FileStorage::open(&path).await.unwrap();
        let owner = storage.create_user().await.unwrap();
        let kept = storage.insert_url("https://kept.example", owner).await.unwrap();
        let deleted = storage.insert_url("https://gone.example", owner).await.unwrap();
        storage
            .delete_batch(&[DeletionIntent::new(deleted, owner)])
            .await
            .unwrap();
        storage.close().await;
        (kept, deleted)
    };

    let reopened = FileStorage::open(&path).await.unwrap();

    assert_eq!(reopened.get_url(kept).await.unwrap(), "https://kept.example");
    assert!(matches!(
        reopened.get_url(deleted).await,
        Err(StorageError::Deleted)
    ));
    assert_eq!(reopened.list_user_urls(1).await.unwrap().len(), 2);
    assert!(matches!(
        reopened.insert_url("https://gone.example", 1).await,
        Err(StorageError::AlreadyExists)
    ));

    let next = reopened.insert_url("https://new.example", 1).await.unwrap();
    assert!(next > deleted);
    assert!(reopened.create_user().await.unwrap() > 1);
}

#[tokio::test]
async fn test_replay_skips_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = log_path(&dir);
    std::fs::write(&path, "1 4 https://a.example false\n\n2 4 https://b.example true\n").unwrap();

    let storage = FileStorage::open(&path).await.unwrap();

    assert_eq!(storage.get_url(1).await.unwrap(), "https://a.example");
    assert!(matches!(storage.get_url(2).await, Err(StorageError::Deleted)));
    assert_eq!(storage.stats().await.unwrap().users, 4);
}

#[tokio::test]
async fn test_replay_rejects_corrupt_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = log_path(&dir);
    std::fs::write(&path, "1 1 https://a.example false\nnot a valid line at all\n").unwrap();

    let result = FileStorage::open(&path).await;

    match result {
        Err(StorageError::Corrupt { line, .. }) => assert_eq!(line, 2),
        Err(e) => panic!("expected corrupt log error, got {e}"),
        Ok(_) => panic!("expected corrupt log error"),
    }
}

#[tokio::test]
async fn test_url_with_whitespace_is_rejected() {
    let (dir, storage) = fresh_storage().await;

    let result = storage.insert_url("https://a.example/a b", 1).await;

    assert!(matches!(result, Err(StorageError::InvalidUrl(_))));
    assert_eq!(std::fs::read_to_string(log_path(&dir)).unwrap(), "");
}

#[cfg(unix)]
#[tokio::test]
async fn test_batch_without_effect_skips_rewrite() {
    use std::os::unix::fs::MetadataExt;

    let (dir, storage) = fresh_storage().await;
    let id = storage.insert_url("https://a.example", 1).await.unwrap();
    let inode_before = std::fs::metadata(log_path(&dir)).unwrap().ino();

    storage
        .delete_batch(&[DeletionIntent::new(id, 2), DeletionIntent::new(77, 1)])
        .await
        .unwrap();

    let inode_after = std::fs::metadata(log_path(&dir)).unwrap().ino();
    assert_eq!(inode_before, inode_after);
    assert!(storage.get_url(id).await.is_ok());
}
