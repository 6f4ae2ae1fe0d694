use serde_json::Value;
use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, DocumentStore};

use super::model::{CreateIssuePayload, Issue, UpdateIssuePayload, MAX_ACTIVE_ISSUES};

/// Create a new issue in a project
pub async fn create_issue(
    store: &dyn DocumentStore,
    project_id: &str,
    payload: CreateIssuePayload,
) -> Result<Issue> {
    let project = crate::projects::service::get_project(store, project_id).await?;

    if let (Some(start), Some(end)) = (payload.start_date, payload.end_date) {
        if start > end {
            return Err(Error::Validation(format!(
                "Issue start date {} is after its end date {}",
                start, end
            )));
        }
    }

    // Issue dates must stay inside the project window when both sides are set
    if let (Some(start), Some(window_start)) = (payload.start_date, project.start_date) {
        if start < window_start {
            return Err(Error::Validation(format!(
                "Issue start date {} falls before the project start {}",
                start, window_start
            )));
        }
    }
    if let (Some(end), Some(window_end)) = (payload.end_date, project.end_date) {
        if end > window_end {
            return Err(Error::Validation(format!(
                "Issue end date {} falls after the project end {}",
                end, window_end
            )));
        }
    }

    let existing = load_issues_for_project(store, project_id).await?;
    let active: Vec<&Issue> = existing.iter().filter(|i| !i.archived).collect();

    if active.iter().any(|i| i.name == payload.name) {
        return Err(Error::Validation(format!(
            "An active issue named \"{}\" already exists in project {}",
            payload.name, project_id
        )));
    }
    if active.len() >= MAX_ACTIVE_ISSUES {
        return Err(Error::Capacity(format!(
            "Project {} already has {} active issues",
            project_id, MAX_ACTIVE_ISSUES
        )));
    }

    let issue_id = uuid::Uuid::new_v4().to_string();
    let now = dates::now_rfc3339();

    let issue = Issue {
        issue_id: issue_id.clone(),
        project_id: project_id.to_string(),
        name: payload.name,
        description: payload.description,
        goal: payload.goal,
        start_date: payload.start_date,
        end_date: payload.end_date,
        theme_color: payload.theme_color,
        archived: false,
        progress: None,
        representative_task_id: None,
        pinned_by: Vec::new(),
        created_at: now,
    };

    store
        .upsert(&paths::issue(project_id, &issue_id), encode(&issue)?)
        .await?;

    Ok(issue)
}

/// Load all issues for a project
pub async fn load_issues_for_project(
    store: &dyn DocumentStore,
    project_id: &str,
) -> Result<Vec<Issue>> {
    let docs = store.list(&paths::issues(project_id), None).await?;

    let mut issues = Vec::new();
    for doc in docs {
        issues.push(doc.decode()?);
    }

    Ok(issues)
}

/// Get a specific issue
pub async fn get_issue(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
) -> Result<Issue> {
    let doc = store
        .get(&paths::issue(project_id, issue_id))
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Issue {} not found in project {}",
                issue_id, project_id
            ))
        })?;

    Ok(doc.decode()?)
}

/// Update an issue. Passing `expected_version` turns the write into an
/// optimistic-concurrency update that fails with a conflict when stale.
pub async fn update_issue(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    payload: UpdateIssuePayload,
    expected_version: Option<u64>,
) -> Result<Issue> {
    let current = get_issue(store, project_id, issue_id).await?;

    if let Some(name) = payload.name.as_deref() {
        if name != current.name {
            let existing = load_issues_for_project(store, project_id).await?;
            let clash = existing
                .iter()
                .any(|i| !i.archived && i.issue_id != issue_id && i.name == name);
            if clash {
                return Err(Error::Validation(format!(
                    "An active issue named \"{}\" already exists in project {}",
                    name, project_id
                )));
            }
        }
    }

    // Unarchiving re-enters the active set, so the cap applies again
    if payload.archived == Some(false) && current.archived {
        let active = crate::projects::service::active_issue_count(store, project_id).await?;
        if active >= MAX_ACTIVE_ISSUES {
            return Err(Error::Capacity(format!(
                "Project {} already has {} active issues",
                project_id, MAX_ACTIVE_ISSUES
            )));
        }
    }

    let mut fields = serde_json::Map::new();

    if let Some(name) = payload.name {
        fields.insert("name".to_string(), Value::String(name));
    }
    if let Some(description) = payload.description {
        fields.insert("description".to_string(), Value::String(description));
    }
    if let Some(goal) = payload.goal {
        fields.insert("goal".to_string(), Value::String(goal));
    }
    if let Some(start_date) = payload.start_date {
        fields.insert("start_date".to_string(), encode(&start_date)?);
    }
    if let Some(end_date) = payload.end_date {
        fields.insert("end_date".to_string(), encode(&end_date)?);
    }
    if let Some(theme_color) = payload.theme_color {
        fields.insert("theme_color".to_string(), Value::String(theme_color));
    }
    if let Some(archived) = payload.archived {
        fields.insert("archived".to_string(), Value::Bool(archived));
    }
    if let Some(representative_task_id) = payload.representative_task_id {
        fields.insert(
            "representative_task_id".to_string(),
            Value::String(representative_task_id),
        );
    }
    if let Some(pinned_by) = payload.pinned_by {
        fields.insert("pinned_by".to_string(), encode(&pinned_by)?);
    }

    if !fields.is_empty() {
        store
            .update(
                &paths::issue(project_id, issue_id),
                Value::Object(fields),
                expected_version,
            )
            .await?;
    }

    get_issue(store, project_id, issue_id).await
}

/// Resolve the final name for an issue arriving in a project: an active-name
/// clash appends " (n)" with the smallest n unused by any issue there,
/// archived ones included.
pub fn resolve_name_conflict(
    desired: &str,
    active_names: &[String],
    all_names: &[String],
) -> String {
    if !active_names.iter().any(|name| name == desired) {
        return desired.to_string();
    }

    let mut n = 1;
    loop {
        let candidate = format!("{} ({})", desired, n);
        if !all_names.iter().any(|name| name == &candidate) {
            return candidate;
        }
        n += 1;
    }
}
