//! Partial failures between the relational store and blob storage, and the
//! reconciler that repairs them.

use std::time::Duration;

use domains::{BlobIntentLog, BlobOp, DomainError, Identity, ObjectStore};
use integration_tests::{file, Harness};

fn owner() -> Identity {
    Identity::new("owner@pets.io")
}

/// Moves the clock past the intents' creation timestamps.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn failed_upload_leaves_no_row() {
    let h = Harness::new().await;
    h.member("owner@pets.io", "Owner").await;
    h.blobs.set_fail_puts(true);

    let err = h
        .posts
        .create("T", "C", Some(&owner()), &[file("a.png", b"a"), file("b.png", b"b")])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Storage(_)));

    // the post itself is committed; the failed attachment is compensated
    let page = h.posts.list("T", 1).await.unwrap();
    let id = page.board_list[0].id;
    assert_eq!(h.rows("attachments", id).await, 0);
    assert_eq!(h.pending_intents().await, 0);
}

#[tokio::test]
async fn failed_overwrite_keeps_previous_blob() {
    let h = Harness::new().await;
    h.member("owner@pets.io", "Owner").await;
    let id = h
        .posts
        .create("T", "C", Some(&owner()), &[file("a.png", b"first")])
        .await
        .unwrap();

    h.blobs.set_fail_puts(true);
    h.posts
        .update(id, "T", "C", Some(&owner()), &[file("a.png", b"second")], &[])
        .await
        .unwrap_err();

    assert_eq!(h.rows("attachments", id).await, 1);
    assert_eq!(std::fs::read(h.blob_path(id, "a.png")).unwrap(), b"first");
}

#[tokio::test]
async fn failed_blob_delete_is_finished_by_reconciler() {
    let h = Harness::new().await;
    h.member("owner@pets.io", "Owner").await;
    let id = h
        .posts
        .create("T", "C", Some(&owner()), &[file("a.png", b"a"), file("b.png", b"b")])
        .await
        .unwrap();

    h.blobs.set_fail_deletes(true);
    let report = h.posts.delete(id, Some(&owner())).await.unwrap();
    assert_eq!(report.removed_files, 2);
    assert_eq!(report.pending_blob_deletes, 2, "every attachment is attempted");
    assert!(h.posts.get(id).await.unwrap().is_none());
    assert!(h.blob_path(id, "a.png").exists());
    assert_eq!(h.pending_intents().await, 2);

    // still failing: attempts are recorded, intents stay
    settle().await;
    let report = h.reconciler.run_once(10).await.unwrap();
    assert_eq!((report.resolved, report.failed), (0, 2));
    let attempts: Vec<i64> = sqlx::query_scalar("SELECT attempts FROM blob_intents")
        .fetch_all(h.db.pool())
        .await
        .unwrap();
    assert!(attempts.iter().all(|&a| a >= 2));

    h.blobs.set_fail_deletes(false);
    let report = h.reconciler.run_once(10).await.unwrap();
    assert_eq!((report.resolved, report.failed), (2, 0));
    assert!(!h.blob_path(id, "a.png").exists());
    assert!(!h.blob_path(id, "b.png").exists());
    assert_eq!(h.pending_intents().await, 0);
}

#[tokio::test]
async fn row_whose_blob_vanished_is_removed() {
    let h = Harness::new().await;
    h.member("owner@pets.io", "Owner").await;
    let id = h
        .posts
        .create("T", "C", Some(&owner()), &[file("a.png", b"a")])
        .await
        .unwrap();

    // simulate a crash between the row upsert and the upload
    let key = format!("prj/board/{id}/a.png");
    h.db.record(BlobOp::Put, id, "a.png", &key).await.unwrap();
    h.blobs.delete(&key).await.unwrap();

    settle().await;
    let report = h.reconciler.run_once(10).await.unwrap();
    assert_eq!(report.resolved, 1);
    assert_eq!(h.rows("attachments", id).await, 0);
    assert_eq!(h.posts.get(id).await.unwrap().unwrap().file_list.len(), 0);
}

#[tokio::test]
async fn consistent_pairs_survive_reconciliation() {
    let h = Harness::new().await;
    h.member("owner@pets.io", "Owner").await;
    let id = h
        .posts
        .create("T", "C", Some(&owner()), &[file("a.png", b"a")])
        .await
        .unwrap();

    let key = format!("prj/board/{id}/a.png");
    h.db.record(BlobOp::Put, id, "a.png", &key).await.unwrap();

    settle().await;
    h.reconciler.run_once(10).await.unwrap();
    assert_eq!(h.rows("attachments", id).await, 1);
    assert!(h.blob_path(id, "a.png").exists());
    assert_eq!(h.pending_intents().await, 0);
}
