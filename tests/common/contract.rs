//! Behaviour every storage backend must share.
//!
//! Each check expects a fresh, empty storage.

use shortener::domain::entities::{BatchUrl, DeletionIntent};
use shortener::domain::repositories::{StorageError, UrlStorage};

fn batch_item(correlation_id: &str, url: &str) -> BatchUrl {
    BatchUrl {
        correlation_id: correlation_id.to_string(),
        original_url: url.to_string(),
    }
}

pub async fn insert_and_resolve(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();

    let id = storage.insert_url("https://a.example/page", owner).await.unwrap();

    assert_eq!(storage.get_url(id).await.unwrap(), "https://a.example/page");
    assert_eq!(storage.get_url_id("https://a.example/page").await.unwrap(), id);
}

pub async fn duplicate_url_conflicts(storage: &dyn UrlStorage) {
    let first = storage.create_user().await.unwrap();
    let second = storage.create_user().await.unwrap();
    let id = storage.insert_url("https://a.example", first).await.unwrap();

    let result = storage.insert_url("https://a.example", second).await;

    assert!(matches!(result, Err(StorageError::AlreadyExists)));
    assert_eq!(storage.get_url_id("https://a.example").await.unwrap(), id);
    assert_eq!(storage.stats().await.unwrap().urls, 1);
    assert!(storage.list_user_urls(second).await.unwrap().is_empty());
}

pub async fn ids_strictly_increase(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();

    let a = storage.insert_url("https://a.example", owner).await.unwrap();
    let _ = storage.insert_url("https://a.example", owner).await;
    let b = storage.insert_url("https://b.example", owner).await.unwrap();
    let c = storage.insert_url("https://c.example", owner).await.unwrap();

    assert!(a < b && b < c, "ids not increasing: {a} {b} {c}");
}

pub async fn unknown_lookups_not_found(storage: &dyn UrlStorage) {
    assert!(matches!(
        storage.get_url(999).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        storage.get_url_id("https://missing.example").await,
        Err(StorageError::NotFound)
    ));
}

pub async fn user_without_urls_lists_empty(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();

    assert!(storage.list_user_urls(owner).await.unwrap().is_empty());
    assert!(storage.list_user_urls(owner + 100).await.unwrap().is_empty());
}

pub async fn owner_delete_marks_deleted(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();
    let id = storage.insert_url("https://a.example", owner).await.unwrap();

    storage
        .delete_batch(&[DeletionIntent::new(id, owner)])
        .await
        .unwrap();

    assert!(matches!(storage.get_url(id).await, Err(StorageError::Deleted)));
    let listed = storage.list_user_urls(owner).await.unwrap();
    assert_eq!(listed.get(&id).map(String::as_str), Some("https://a.example"));
}

pub async fn foreign_delete_is_ignored(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();
    let intruder = storage.create_user().await.unwrap();
    let id = storage.insert_url("https://a.example", owner).await.unwrap();

    storage
        .delete_batch(&[DeletionIntent::new(id, intruder)])
        .await
        .unwrap();

    assert_eq!(storage.get_url(id).await.unwrap(), "https://a.example");
}

pub async fn delete_never_reverts(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();
    let id = storage.insert_url("https://a.example", owner).await.unwrap();
    let intent = DeletionIntent::new(id, owner);

    storage.delete_batch(&[intent]).await.unwrap();
    storage.delete_batch(&[intent, intent]).await.unwrap();
    let reinsert = storage.insert_url("https://a.example", owner).await;

    assert!(matches!(reinsert, Err(StorageError::AlreadyExists)));
    assert!(matches!(storage.get_url(id).await, Err(StorageError::Deleted)));
}

pub async fn mixed_batch_applies_only_owned(storage: &dyn UrlStorage) {
    let alice = storage.create_user().await.unwrap();
    let bob = storage.create_user().await.unwrap();
    let a1 = storage.insert_url("https://a1.example", alice).await.unwrap();
    let a2 = storage.insert_url("https://a2.example", alice).await.unwrap();
    let b1 = storage.insert_url("https://b1.example", bob).await.unwrap();

    storage
        .delete_batch(&[
            DeletionIntent::new(a1, alice),
            DeletionIntent::new(b1, alice),
            DeletionIntent::new(9_999, alice),
            DeletionIntent::new(a2, bob),
        ])
        .await
        .unwrap();

    assert!(matches!(storage.get_url(a1).await, Err(StorageError::Deleted)));
    assert!(storage.get_url(a2).await.is_ok());
    assert!(storage.get_url(b1).await.is_ok());
}

pub async fn empty_delete_batch_is_noop(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();
    let id = storage.insert_url("https://a.example", owner).await.unwrap();

    storage.delete_batch(&[]).await.unwrap();

    assert!(storage.get_url(id).await.is_ok());
}

pub async fn insert_batch_omits_existing(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();
    let existing = storage.insert_url("https://a.example", owner).await.unwrap();

    let inserted = storage
        .insert_batch(
            vec![
                batch_item("1", "https://a.example"),
                batch_item("2", "https://b.example"),
                batch_item("3", "https://c.example"),
                batch_item("4", "https://b.example"),
            ],
            owner,
        )
        .await
        .unwrap();

    let correlation_ids: Vec<&str> = inserted
        .iter()
        .map(|item| item.correlation_id.as_str())
        .collect();
    assert_eq!(correlation_ids, vec!["2", "3"]);
    assert!(inserted.iter().all(|item| item.url_id > existing));
    assert_eq!(
        storage.get_url(inserted[0].url_id).await.unwrap(),
        "https://b.example"
    );
    assert_eq!(storage.list_user_urls(owner).await.unwrap().len(), 3);
}

pub async fn stats_count_urls_and_users(storage: &dyn UrlStorage) {
    let first = storage.create_user().await.unwrap();
    let second = storage.create_user().await.unwrap();
    assert!(first < second);

    storage.insert_url("https://a.example", first).await.unwrap();
    let id = storage.insert_url("https://b.example", second).await.unwrap();
    storage
        .delete_batch(&[DeletionIntent::new(id, second)])
        .await
        .unwrap();

    let stats = storage.stats().await.unwrap();
    assert_eq!(stats.urls, 2);
    assert_eq!(stats.users, 2);
}

pub async fn ping_and_close(storage: &dyn UrlStorage) {
    storage.ping().await.unwrap();

    storage.close().await;
    storage.close().await;
}

pub async fn inserts_do_not_allocate_users(storage: &dyn UrlStorage) {
    let owner = storage.create_user().await.unwrap();
    storage.insert_url("https://a.example", owner).await.unwrap();
    storage
        .insert_batch(vec![batch_item("1", "https://b.example")], owner)
        .await
        .unwrap();

    assert_eq!(storage.stats().await.unwrap().users, 1);
    assert_eq!(storage.create_user().await.unwrap(), owner + 1);
}
