//! Integration tests for the signature store and event log against a real
//! SQLite database.
//!
//! Run with: cargo test --package facegate-storage --test integration_database

use facegate_core::{EnrollmentPolicy, FaceSignature, Identity, IdentityId, Verdict};
use facegate_storage::{
    AccessEvent, AccessEventRepository, AccessOutcome, Database, DatabaseConfig,
    SignatureStore, SqliteAccessEventRepository, SqliteSignatureStore, StorageError,
};
use std::sync::Arc;
use tokio::sync::Barrier;

fn sig(values: &[f64]) -> FaceSignature {
    FaceSignature::new(values.to_vec()).unwrap()
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' \
         AND name IN ('enrolled_identities', 'face_samples', 'access_events')",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 3);
    db.close().await;
}

#[tokio::test]
async fn test_file_backed_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("facegate.db");
    let path = path.to_string_lossy().into_owned();

    {
        let db = Database::new(DatabaseConfig::new(path.clone())).await.unwrap();
        let store = SqliteSignatureStore::new(db.pool().clone());
        store
            .upsert(&Identity::named("alice").unwrap(), sig(&[0.25, -0.5, 1.0]))
            .await
            .unwrap();
        db.close().await;
    }

    let db = Database::new(DatabaseConfig::new(path)).await.unwrap();
    let store = SqliteSignatureStore::new(db.pool().clone());
    let candidates = store.list_all().await.unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].identity.id.as_str(), "alice");
    assert_eq!(candidates[0].signature.as_slice(), &[0.25, -0.5, 1.0]);
    db.close().await;
}

#[tokio::test]
async fn test_policies_reduce_differently() {
    let db = Database::in_memory().await.unwrap();
    let alice = Identity::named("alice").unwrap();

    let multi = SqliteSignatureStore::with_policy(db.pool().clone(), EnrollmentPolicy::MultiSample);
    multi.upsert(&alice, sig(&[0.0, 0.0])).await.unwrap();
    multi.upsert(&alice, sig(&[1.0, 1.0])).await.unwrap();
    multi.upsert(&alice, sig(&[2.0, 2.0])).await.unwrap();
    assert_eq!(multi.list_all().await.unwrap()[0].signature.as_slice(), &[1.0, 1.0]);

    // Switching to single-active collapses to the latest sample on next upsert.
    let single = SqliteSignatureStore::with_policy(db.pool().clone(), EnrollmentPolicy::SingleActive);
    assert_eq!(single.upsert(&alice, sig(&[5.0, 4.0])).await.unwrap(), 1);
    assert_eq!(single.list_all().await.unwrap()[0].signature.as_slice(), &[5.0, 4.0]);
}

#[tokio::test]
async fn test_enrollment_order_is_stable() {
    let db = Database::in_memory().await.unwrap();
    let store = SqliteSignatureStore::new(db.pool().clone());

    for name in ["carol", "alice", "bob"] {
        store
            .upsert(&Identity::named(name).unwrap(), sig(&[0.1]))
            .await
            .unwrap();
    }
    // A second sample must not move alice.
    store
        .upsert(&Identity::named("alice").unwrap(), sig(&[0.3]))
        .await
        .unwrap();

    let names: Vec<_> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.identity.id.to_string())
        .collect();
    assert_eq!(names, vec!["carol", "alice", "bob"]);

    let summaries = store.list_enrollments().await.unwrap();
    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[1].sample_count, 2);
}

#[tokio::test]
async fn test_remove_unknown_identity() {
    let db = Database::in_memory().await.unwrap();
    let store = SqliteSignatureStore::new(db.pool().clone());

    let err = store
        .remove(&IdentityId::new("ghost").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { ref value, .. } if value == "ghost"));
}

#[tokio::test]
async fn test_corrupted_embedding_surfaces() {
    let db = Database::in_memory().await.unwrap();
    let store = SqliteSignatureStore::new(db.pool().clone());
    store
        .upsert(&Identity::named("alice").unwrap(), sig(&[1.0]))
        .await
        .unwrap();

    sqlx::query("UPDATE face_samples SET embedding = ?")
        .bind(f64::NAN.to_le_bytes().to_vec())
        .execute(db.pool())
        .await
        .unwrap();

    let err = store.list_all().await.unwrap_err();
    assert!(matches!(err, StorageError::Corrupted(_)));
}

#[tokio::test]
async fn test_events_outlive_enrollment() {
    let db = Database::in_memory().await.unwrap();
    let store = SqliteSignatureStore::new(db.pool().clone());
    let events = SqliteAccessEventRepository::new(db.pool().clone());
    let alice = Identity::named("alice").unwrap();

    store.upsert(&alice, sig(&[0.5, 0.5])).await.unwrap();
    events
        .create(&AccessEvent::new(Some(&alice), AccessOutcome::Matched, Some(0.1)))
        .await
        .unwrap();
    store.remove(&alice.id).await.unwrap();

    let history = events.find_by_identity(&alice.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].display_name.as_deref(), Some("alice"));
    assert_eq!(history[0].get_verdict(), Some(Verdict::Matched));
}

#[tokio::test]
async fn test_concurrent_enrollments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    let db = Database::new(DatabaseConfig::new(path.to_string_lossy().into_owned()))
        .await
        .unwrap();
    let store = Arc::new(SqliteSignatureStore::new(db.pool().clone()));

    const NUM_CONCURRENT_TASKS: usize = 8;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let handles: Vec<_> = (0..NUM_CONCURRENT_TASKS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                let identity = Identity::named(&format!("user-{i}")).unwrap();
                store.upsert(&identity, sig(&[i as f64, 1.0])).await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.unwrap().unwrap(), 1);
    }

    assert_eq!(store.list_all().await.unwrap().len(), NUM_CONCURRENT_TASKS);
    db.close().await;
}

#[tokio::test]
async fn test_concurrent_mixed_dimensions_admit_one() {
    let db = Database::in_memory().await.unwrap();
    let store = Arc::new(SqliteSignatureStore::new(db.pool().clone()));

    let a = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .upsert(&Identity::named("two").unwrap(), sig(&[0.0, 0.0]))
                .await
        })
    };
    let b = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .upsert(&Identity::named("three").unwrap(), sig(&[0.0, 0.0, 0.0]))
                .await
        })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert!(a.is_ok() ^ b.is_ok());

    let candidates = store.list_all().await.unwrap();
    assert_eq!(candidates.len(), 1);
}
