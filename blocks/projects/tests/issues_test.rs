mod common;

use common::*;
use projects_block::delete_issue;
use stride_atoms::tasks::model::Importance;
use stride_atoms::{attachments, comments, issues, projects, tasks};
use stride_shared::error::Error;
use stride_shared::store::{MemoryBlobStore, MemoryStore};

#[tokio::test]
async fn deleting_an_issue_cascades_through_its_tasks() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    put_project(&store, &project("p1", "Apollo")).await;
    put_issue(&store, &issue("p1", "i1", "Launch")).await;
    put_task(&store, &task("p1", "i1", "t1", "Wiring")).await;
    put_task(&store, &task("p1", "i1", "t2", "Painting")).await;

    comments::service::add_comment(&store, "p1", "i1", "t1", ADMIN, "tracking note")
        .await
        .unwrap();
    attachments::service::store_attachment(
        &store,
        &blobs,
        "p1",
        "i1",
        "t1",
        "plan.pdf",
        "application/pdf",
        b"%PDF-1.4".to_vec(),
    )
    .await
    .unwrap();
    assert_eq!(blobs.blob_count().await, 1);

    delete_issue(&store, &blobs, "p1", "i1").await.unwrap();

    let err = issues::service::get_issue(&store, "p1", "i1").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let remaining = tasks::service::load_tasks_for_issue(&store, "p1", "i1")
        .await
        .unwrap();
    assert!(remaining.is_empty());
    let notes = comments::service::load_comments_for_task(&store, "p1", "i1", "t1")
        .await
        .unwrap();
    assert!(notes.is_empty());
    let files = attachments::service::load_attachments_for_task(&store, "p1", "i1", "t1")
        .await
        .unwrap();
    assert!(files.is_empty());
    assert_eq!(blobs.blob_count().await, 0);
}

#[tokio::test]
async fn deleting_a_missing_issue_is_not_found() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    put_project(&store, &project("p1", "Apollo")).await;

    let err = delete_issue(&store, &blobs, "p1", "ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn deletion_refreshes_the_project_progress() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new();
    put_project(&store, &project("p1", "Apollo")).await;

    let mut doomed = issue("p1", "i1", "Launch");
    doomed.progress = Some(20.0);
    put_issue(&store, &doomed).await;
    put_task(
        &store,
        &weighted_task("p1", "i1", "t1", Some(Importance::High), Some(20.0)),
    )
    .await;

    let mut surviving = issue("p1", "i2", "Groundwork");
    surviving.progress = Some(60.0);
    put_issue(&store, &surviving).await;

    delete_issue(&store, &blobs, "p1", "i1").await.unwrap();

    let refreshed = projects::service::get_project(&store, "p1").await.unwrap();
    assert_eq!(refreshed.progress, Some(60.0));
}
