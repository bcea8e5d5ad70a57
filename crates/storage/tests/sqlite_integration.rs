use fiszki_core::model::{BookmarkSet, ProgressRecord};
use fiszki_core::time::fixed_now;
use storage::repository::{StateRepository, StateSlot, StateStore, StorageError};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrips_every_slot() {
    let store = StateStore::sqlite("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");

    let mut record = ProgressRecord::new();
    record.record_study("animals", "animals-0".into(), 10, fixed_now());
    store.save_progress(&record).await.unwrap();

    let mut bookmarks = BookmarkSet::new();
    bookmarks.toggle("dog-pies".to_string());
    store.save_bookmarks(&bookmarks).await.unwrap();

    assert_eq!(store.load_progress().await.unwrap().unwrap(), record);
    assert_eq!(store.load_bookmarks().await.unwrap().unwrap(), bookmarks);
    assert!(store.load_difficulty().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_save_overwrites_the_whole_document() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save(StateSlot::Bookmarks, r#"["a","b"]"#).await.unwrap();
    repo.save(StateSlot::Bookmarks, r#"["c"]"#).await.unwrap();

    let raw = repo.load(StateSlot::Bookmarks).await.unwrap().unwrap();
    assert_eq!(raw, r#"["c"]"#);
}

#[tokio::test]
async fn sqlite_clear_removes_only_its_slot() {
    let store = StateStore::sqlite("sqlite:file:memdb_clear?mode=memory&cache=shared")
        .await
        .expect("connect");

    store.save_progress(&ProgressRecord::new()).await.unwrap();
    store.save_bookmarks(&BookmarkSet::new()).await.unwrap();

    store.clear(StateSlot::Progress).await.unwrap();

    assert!(store.load_progress().await.unwrap().is_none());
    assert!(store.load_bookmarks().await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_migrate_is_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    repo.save(StateSlot::Progress, "{}").await.unwrap();
    assert!(repo.load(StateSlot::Progress).await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_surfaces_corrupt_documents_as_serialization_errors() {
    let store = StateStore::sqlite("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");

    repo.save(StateSlot::Difficulty, "not json").await.unwrap();

    let err = store.load_difficulty().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
