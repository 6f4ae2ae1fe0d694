//! Shared fixtures for the projects-block integration suites.
//!
//! Documents are seeded straight into the in-memory store, bypassing the
//! service constructors, so every test works with stable ids.

#![allow(dead_code)]

use chrono::NaiveDate;
use stride_atoms::issues::model::Issue;
use stride_atoms::projects::model::Project;
use stride_atoms::tags::model::Tag;
use stride_atoms::tasks::model::{Importance, Task};
use stride_shared::store::{encode, paths, DocumentStore, MemoryStore};

/// Caller used throughout the suites; admin of every fixture project.
pub const ADMIN: &str = "root";

pub fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn project(project_id: &str, name: &str) -> Project {
    serde_json::from_value(serde_json::json!({
        "project_id": project_id,
        "name": name,
        "member_ids": [ADMIN],
        "roles": { (ADMIN): "admin" },
    }))
    .unwrap()
}

pub fn issue(project_id: &str, issue_id: &str, name: &str) -> Issue {
    serde_json::from_value(serde_json::json!({
        "issue_id": issue_id,
        "project_id": project_id,
        "name": name,
    }))
    .unwrap()
}

pub fn task(project_id: &str, issue_id: &str, task_id: &str, title: &str) -> Task {
    serde_json::from_value(serde_json::json!({
        "task_id": task_id,
        "project_id": project_id,
        "issue_id": issue_id,
        "title": title,
    }))
    .unwrap()
}

/// Task carrying just the fields the aggregation engine reads
pub fn weighted_task(
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    importance: Option<Importance>,
    progress: Option<f64>,
) -> Task {
    let mut task = task(project_id, issue_id, task_id, task_id);
    task.importance = importance;
    task.progress = progress;
    task
}

pub fn tag(project_id: &str, tag_id: &str, name: &str) -> Tag {
    serde_json::from_value(serde_json::json!({
        "tag_id": tag_id,
        "project_id": project_id,
        "name": name,
    }))
    .unwrap()
}

pub async fn put_project(store: &MemoryStore, project: &Project) {
    store
        .upsert(&paths::project(&project.project_id), encode(project).unwrap())
        .await
        .unwrap();
}

pub async fn put_issue(store: &MemoryStore, issue: &Issue) {
    store
        .upsert(
            &paths::issue(&issue.project_id, &issue.issue_id),
            encode(issue).unwrap(),
        )
        .await
        .unwrap();
}

pub async fn put_task(store: &MemoryStore, task: &Task) {
    store
        .upsert(
            &paths::task(&task.project_id, &task.issue_id, &task.task_id),
            encode(task).unwrap(),
        )
        .await
        .unwrap();
}

pub async fn put_tag(store: &MemoryStore, tag: &Tag) {
    store
        .upsert(
            &paths::tag(&tag.project_id, &tag.tag_id),
            encode(tag).unwrap(),
        )
        .await
        .unwrap();
}
