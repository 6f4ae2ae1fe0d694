use serde_json::Value;
use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, BlobStore, DocumentStore};

use super::model::{ChecklistItem, CreateTaskPayload, Task, TaskStatus, UpdateTaskPayload};
use crate::issues::model::Issue;

/// Create a new task under an issue
pub async fn create_task(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    payload: CreateTaskPayload,
) -> Result<Task> {
    let issue = crate::issues::service::get_issue(store, project_id, issue_id).await?;

    validate_window(&issue, payload.start_date, payload.end_date)?;
    validate_assignees(store, project_id, &payload.assignee_ids).await?;
    validate_tags(store, project_id, &payload.tag_ids).await?;

    let task_id = uuid::Uuid::new_v4().to_string();
    let now = dates::now_rfc3339();

    let task = Task {
        task_id: task_id.clone(),
        project_id: project_id.to_string(),
        issue_id: issue_id.to_string(),
        title: payload.title,
        start_date: payload.start_date,
        end_date: payload.end_date,
        importance: payload.importance,
        status: TaskStatus::Incomplete,
        archived: false,
        assignee_ids: payload.assignee_ids,
        tag_ids: payload.tag_ids,
        checklist: Vec::new(),
        progress: None,
        created_at: now,
    };

    store
        .upsert(&paths::task(project_id, issue_id, &task_id), encode(&task)?)
        .await?;

    Ok(task)
}

/// Load all tasks for an issue
pub async fn load_tasks_for_issue(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
) -> Result<Vec<Task>> {
    let docs = store.list(&paths::tasks(project_id, issue_id), None).await?;

    let mut tasks = Vec::new();
    for doc in docs {
        tasks.push(doc.decode()?);
    }

    Ok(tasks)
}

/// Get a specific task
pub async fn get_task(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
) -> Result<Task> {
    let doc = store
        .get(&paths::task(project_id, issue_id, task_id))
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Task {} not found in issue {}",
                task_id, issue_id
            ))
        })?;

    Ok(doc.decode()?)
}

/// Update a task. Passing `expected_version` turns the write into an
/// optimistic-concurrency update that fails with a conflict when stale.
pub async fn update_task(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    payload: UpdateTaskPayload,
    expected_version: Option<u64>,
) -> Result<Task> {
    let current = get_task(store, project_id, issue_id, task_id).await?;

    if payload.start_date.is_some() || payload.end_date.is_some() {
        let issue = crate::issues::service::get_issue(store, project_id, issue_id).await?;
        let start = payload.start_date.or(current.start_date);
        let end = payload.end_date.or(current.end_date);
        validate_window(&issue, start, end)?;
    }
    if let Some(assignee_ids) = &payload.assignee_ids {
        validate_assignees(store, project_id, assignee_ids).await?;
    }
    if let Some(tag_ids) = &payload.tag_ids {
        validate_tags(store, project_id, tag_ids).await?;
    }

    let mut fields = serde_json::Map::new();

    if let Some(title) = payload.title {
        fields.insert("title".to_string(), Value::String(title));
    }
    if let Some(start_date) = payload.start_date {
        fields.insert("start_date".to_string(), encode(&start_date)?);
    }
    if let Some(end_date) = payload.end_date {
        fields.insert("end_date".to_string(), encode(&end_date)?);
    }
    if let Some(importance) = payload.importance {
        fields.insert("importance".to_string(), encode(&importance)?);
    }
    if let Some(status) = payload.status {
        fields.insert("status".to_string(), encode(&status)?);
    }
    if let Some(archived) = payload.archived {
        fields.insert("archived".to_string(), Value::Bool(archived));
    }
    if let Some(assignee_ids) = payload.assignee_ids {
        fields.insert("assignee_ids".to_string(), encode(&assignee_ids)?);
    }
    if let Some(tag_ids) = payload.tag_ids {
        fields.insert("tag_ids".to_string(), encode(&tag_ids)?);
    }

    if !fields.is_empty() {
        store
            .update(
                &paths::task(project_id, issue_id, task_id),
                Value::Object(fields),
                expected_version,
            )
            .await?;
    }

    get_task(store, project_id, issue_id, task_id).await
}

/// Set a task's progress directly. Accepts values from 0 to 100.
pub async fn set_task_progress(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    progress: f64,
) -> Result<Task> {
    if !(0.0..=100.0).contains(&progress) {
        return Err(Error::Validation(format!(
            "Task progress {} is outside the range 0 to 100",
            progress
        )));
    }

    // Ensure the task exists before writing
    get_task(store, project_id, issue_id, task_id).await?;

    let mut fields = serde_json::Map::new();
    fields.insert("progress".to_string(), encode(&progress)?);

    store
        .update(
            &paths::task(project_id, issue_id, task_id),
            Value::Object(fields),
            None,
        )
        .await?;

    get_task(store, project_id, issue_id, task_id).await
}

/// Replace a task's checklist and re-derive its progress and status
pub async fn set_task_checklist(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    items: Vec<ChecklistItem>,
) -> Result<Task> {
    get_task(store, project_id, issue_id, task_id).await?;

    let (progress, status) = derive_checklist_state(&items);

    let mut fields = serde_json::Map::new();
    fields.insert("checklist".to_string(), encode(&items)?);
    fields.insert("progress".to_string(), encode(&progress)?);
    fields.insert("status".to_string(), encode(&status)?);

    store
        .update(
            &paths::task(project_id, issue_id, task_id),
            Value::Object(fields),
            None,
        )
        .await?;

    get_task(store, project_id, issue_id, task_id).await
}

/// Delete a task together with its comments and attachments
pub async fn delete_task(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
) -> Result<()> {
    // Delete comments under the task
    let comments =
        crate::comments::service::load_comments_for_task(store, project_id, issue_id, task_id)
            .await?;
    for comment in comments {
        crate::comments::service::delete_comment(
            store,
            project_id,
            issue_id,
            task_id,
            &comment.comment_id,
        )
        .await?;
    }

    // Delete attachments under the task, blob content included
    let attachments =
        crate::attachments::service::load_attachments_for_task(store, project_id, issue_id, task_id)
            .await?;
    for attachment in attachments {
        crate::attachments::service::delete_attachment(
            store,
            blobs,
            project_id,
            issue_id,
            task_id,
            &attachment.attachment_id,
        )
        .await?;
    }

    store
        .delete(&paths::task(project_id, issue_id, task_id))
        .await?;

    Ok(())
}

/// Progress and status jointly derived from a checklist snapshot. An empty
/// or untouched list maps to 0 and incomplete; a fully ticked list maps to
/// 100 and completed; anything in between is in progress, rounded to one
/// decimal place.
pub fn derive_checklist_state(items: &[ChecklistItem]) -> (f64, TaskStatus) {
    let total = items.len();
    let done = items.iter().filter(|item| item.completed).count();

    if total == 0 || done == 0 {
        return (0.0, TaskStatus::Incomplete);
    }
    if done == total {
        return (100.0, TaskStatus::Completed);
    }

    let progress = (done as f64 * 100.0 / total as f64 * 10.0).round() / 10.0;
    (progress, TaskStatus::InProgress)
}

// PRIVATE FUNCTIONS

fn validate_window(
    issue: &Issue,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(Error::Validation(format!(
                "Task start date {} is after its end date {}",
                start, end
            )));
        }
    }

    // Task dates must stay inside the issue window when both sides are set
    if let (Some(start), Some(window_start)) = (start, issue.start_date) {
        if start < window_start {
            return Err(Error::Validation(format!(
                "Task start date {} falls before the issue start {}",
                start, window_start
            )));
        }
    }
    if let (Some(end), Some(window_end)) = (end, issue.end_date) {
        if end > window_end {
            return Err(Error::Validation(format!(
                "Task end date {} falls after the issue end {}",
                end, window_end
            )));
        }
    }

    Ok(())
}

async fn validate_assignees(
    store: &dyn DocumentStore,
    project_id: &str,
    assignee_ids: &[String],
) -> Result<()> {
    if assignee_ids.is_empty() {
        return Ok(());
    }

    let project = crate::projects::service::get_project(store, project_id).await?;
    for assignee in assignee_ids {
        if !project.is_member(assignee) {
            return Err(Error::Validation(format!(
                "User {} is not a member of project {}",
                assignee, project_id
            )));
        }
    }

    Ok(())
}

async fn validate_tags(
    store: &dyn DocumentStore,
    project_id: &str,
    tag_ids: &[String],
) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let tags = crate::tags::service::load_tags_for_project(store, project_id).await?;
    for tag_id in tag_ids {
        if !tags.iter().any(|t| &t.tag_id == tag_id) {
            return Err(Error::Validation(format!(
                "Tag {} does not exist in project {}",
                tag_id, project_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::model::CreateIssuePayload;
    use crate::projects::model::CreateProjectPayload;
    use crate::tasks::model::Importance;
    use stride_shared::store::{MemoryBlobStore, MemoryStore};

    fn item(id: &str, completed: bool) -> ChecklistItem {
        ChecklistItem {
            id: id.to_string(),
            text: format!("step {}", id),
            completed,
        }
    }

    #[test]
    fn importance_weights_follow_the_band_table() {
        assert_eq!(Importance::Critical.weight(), 4.0);
        assert_eq!(Importance::High.weight(), 3.0);
        assert_eq!(Importance::Medium.weight(), 2.0);
        assert_eq!(Importance::Low.weight(), 1.0);
    }

    #[test]
    fn unset_importance_falls_back_to_unit_weight() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "task_id": "t1",
            "project_id": "p1",
            "issue_id": "i1",
        }))
        .unwrap();

        assert_eq!(task.weight(), 1.0);
        assert_eq!(task.status, TaskStatus::Incomplete);
        assert!(!task.excluded_from_progress());
    }

    #[test]
    fn empty_checklist_derives_zero_and_incomplete() {
        assert_eq!(derive_checklist_state(&[]), (0.0, TaskStatus::Incomplete));
    }

    #[test]
    fn untouched_checklist_stays_incomplete() {
        let items = vec![item("a", false), item("b", false)];
        assert_eq!(
            derive_checklist_state(&items),
            (0.0, TaskStatus::Incomplete)
        );
    }

    #[test]
    fn partial_checklist_rounds_to_one_decimal() {
        let items = vec![item("a", true), item("b", false), item("c", false)];
        assert_eq!(
            derive_checklist_state(&items),
            (33.3, TaskStatus::InProgress)
        );
    }

    #[test]
    fn full_checklist_completes_the_task() {
        let items = vec![item("a", true), item("b", true)];
        assert_eq!(
            derive_checklist_state(&items),
            (100.0, TaskStatus::Completed)
        );
    }

    async fn seeded_issue(store: &MemoryStore) -> (String, String) {
        let project = crate::projects::service::create_project(
            store,
            "owner-1",
            CreateProjectPayload {
                name: "Apollo".to_string(),
                description: None,
                goal: None,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();

        let issue = crate::issues::service::create_issue(
            store,
            &project.project_id,
            CreateIssuePayload {
                name: "Launch".to_string(),
                description: None,
                goal: None,
                start_date: None,
                end_date: None,
                theme_color: None,
            },
        )
        .await
        .unwrap();

        (project.project_id, issue.issue_id)
    }

    fn bare_payload(title: &str) -> CreateTaskPayload {
        CreateTaskPayload {
            title: title.to_string(),
            start_date: None,
            end_date: None,
            importance: None,
            assignee_ids: Vec::new(),
            tag_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn assignees_must_be_project_members() {
        let store = MemoryStore::new();
        let (project_id, issue_id) = seeded_issue(&store).await;

        let mut payload = bare_payload("Fit check");
        payload.assignee_ids = vec!["stranger".to_string()];

        let err = create_task(&store, &project_id, &issue_id, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_tags_are_rejected() {
        let store = MemoryStore::new();
        let (project_id, issue_id) = seeded_issue(&store).await;

        let mut payload = bare_payload("Fit check");
        payload.tag_ids = vec!["no-such-tag".to_string()];

        let err = create_task(&store, &project_id, &issue_id, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn checklist_updates_persist_derived_progress() {
        let store = MemoryStore::new();
        let (project_id, issue_id) = seeded_issue(&store).await;
        let task = create_task(&store, &project_id, &issue_id, bare_payload("Wiring"))
            .await
            .unwrap();

        let updated = set_task_checklist(
            &store,
            &project_id,
            &issue_id,
            &task.task_id,
            vec![item("a", true), item("b", false)],
        )
        .await
        .unwrap();

        assert_eq!(updated.progress, Some(50.0));
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.checklist.len(), 2);
    }

    #[tokio::test]
    async fn out_of_range_progress_is_rejected() {
        let store = MemoryStore::new();
        let (project_id, issue_id) = seeded_issue(&store).await;
        let task = create_task(&store, &project_id, &issue_id, bare_payload("Wiring"))
            .await
            .unwrap();

        let err = set_task_progress(&store, &project_id, &issue_id, &task.task_id, 120.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = set_task_progress(&store, &project_id, &issue_id, &task.task_id, -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn task_dates_must_fit_the_issue_window() {
        let store = MemoryStore::new();
        let project = crate::projects::service::create_project(
            &store,
            "owner-1",
            CreateProjectPayload {
                name: "Apollo".to_string(),
                description: None,
                goal: None,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
        let issue = crate::issues::service::create_issue(
            &store,
            &project.project_id,
            CreateIssuePayload {
                name: "Launch".to_string(),
                description: None,
                goal: None,
                start_date: Some("2026-03-01".parse().unwrap()),
                end_date: Some("2026-03-31".parse().unwrap()),
                theme_color: None,
            },
        )
        .await
        .unwrap();

        let mut payload = bare_payload("Early bird");
        payload.start_date = Some("2026-02-20".parse().unwrap());

        let err = create_task(&store, &project.project_id, &issue.issue_id, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn delete_task_cascades_to_comments_and_attachments() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let (project_id, issue_id) = seeded_issue(&store).await;
        let task = create_task(&store, &project_id, &issue_id, bare_payload("Wiring"))
            .await
            .unwrap();

        crate::comments::service::add_comment(
            &store,
            &project_id,
            &issue_id,
            &task.task_id,
            "owner-1",
            "Looks good",
        )
        .await
        .unwrap();

        let attachment = crate::attachments::service::store_attachment(
            &store,
            &blobs,
            &project_id,
            &issue_id,
            &task.task_id,
            "plan.pdf",
            "application/pdf",
            b"plan".to_vec(),
        )
        .await
        .unwrap();
        assert!(blobs.contains(&attachment.storage_path).await);

        delete_task(&store, &blobs, &project_id, &issue_id, &task.task_id)
            .await
            .unwrap();

        let err = get_task(&store, &project_id, &issue_id, &task.task_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(
            crate::comments::service::load_comments_for_task(
                &store,
                &project_id,
                &issue_id,
                &task.task_id
            )
            .await
            .unwrap()
            .is_empty()
        );
        assert!(!blobs.contains(&attachment.storage_path).await);
        assert_eq!(blobs.blob_count().await, 0);
    }
}
