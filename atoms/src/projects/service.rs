use std::collections::HashMap;

use serde_json::Value;
use stride_shared::auth::ProjectRole;
use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, DocumentStore, FieldFilter};

use super::model::{CreateProjectPayload, Project, UpdateProjectPayload};

/// Create a new project with the creator as its first member and admin
pub async fn create_project(
    store: &dyn DocumentStore,
    creator_id: &str,
    payload: CreateProjectPayload,
) -> Result<Project> {
    if let (Some(start), Some(end)) = (payload.start_date, payload.end_date) {
        if start > end {
            return Err(Error::Validation(format!(
                "Project start date {} is after its end date {}",
                start, end
            )));
        }
    }

    let project_id = uuid::Uuid::new_v4().to_string();
    let now = dates::now_rfc3339();

    let mut roles = HashMap::new();
    roles.insert(creator_id.to_string(), ProjectRole::Admin);

    let project = Project {
        project_id: project_id.clone(),
        name: payload.name,
        description: payload.description,
        goal: payload.goal,
        start_date: payload.start_date,
        end_date: payload.end_date,
        member_ids: vec![creator_id.to_string()],
        roles,
        archived: false,
        progress: None,
        created_at: now,
    };

    store
        .upsert(&paths::project(&project_id), encode(&project)?)
        .await?;

    Ok(project)
}

/// Get a specific project
pub async fn get_project(store: &dyn DocumentStore, project_id: &str) -> Result<Project> {
    let doc = store
        .get(&paths::project(project_id))
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project {} not found", project_id)))?;

    Ok(doc.decode()?)
}

/// List all projects
pub async fn list_projects(store: &dyn DocumentStore) -> Result<Vec<Project>> {
    let docs = store.list(&paths::projects(), None).await?;

    let mut projects = Vec::new();
    for doc in docs {
        projects.push(doc.decode()?);
    }

    Ok(projects)
}

/// Update a project
pub async fn update_project(
    store: &dyn DocumentStore,
    project_id: &str,
    payload: UpdateProjectPayload,
) -> Result<Project> {
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
    if let Some(archived) = payload.archived {
        fields.insert("archived".to_string(), Value::Bool(archived));
    }

    if !fields.is_empty() {
        store
            .update(&paths::project(project_id), Value::Object(fields), None)
            .await?;
    }

    get_project(store, project_id).await
}

/// Add a user to the project roster with the given role
pub async fn add_member(
    store: &dyn DocumentStore,
    project_id: &str,
    user_id: &str,
    role: ProjectRole,
) -> Result<Project> {
    let mut project = get_project(store, project_id).await?;

    if !project.is_member(user_id) {
        project.member_ids.push(user_id.to_string());
    }
    project.roles.insert(user_id.to_string(), role);

    let fields = serde_json::json!({
        "member_ids": &project.member_ids,
        "roles": &project.roles,
    });
    store
        .update(&paths::project(project_id), fields, None)
        .await?;

    Ok(project)
}

/// Number of non-archived issues currently in the project
pub async fn active_issue_count(store: &dyn DocumentStore, project_id: &str) -> Result<usize> {
    let active = store
        .list(
            &paths::issues(project_id),
            Some(&FieldFilter::eq("archived", false)),
        )
        .await?;

    Ok(active.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_shared::store::MemoryStore;

    fn payload(name: &str) -> CreateProjectPayload {
        CreateProjectPayload {
            name: name.to_string(),
            description: None,
            goal: None,
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn creator_becomes_member_and_admin() {
        let store = MemoryStore::new();
        let project = create_project(&store, "alice", payload("Alpha")).await.unwrap();

        assert_eq!(project.member_ids, vec!["alice".to_string()]);
        assert_eq!(project.roles.get("alice"), Some(&ProjectRole::Admin));
        assert!(project.progress.is_none());

        let loaded = get_project(&store, &project.project_id).await.unwrap();
        assert_eq!(loaded.name, "Alpha");
    }

    #[tokio::test]
    async fn inverted_date_range_is_rejected() {
        let store = MemoryStore::new();
        let err = create_project(
            &store,
            "alice",
            CreateProjectPayload {
                name: "Alpha".to_string(),
                description: None,
                goal: None,
                start_date: Some("2026-06-01".parse().unwrap()),
                end_date: Some("2026-01-01".parse().unwrap()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let store = MemoryStore::new();
        let project = create_project(&store, "alice", payload("Alpha")).await.unwrap();

        let updated = update_project(
            &store,
            &project.project_id,
            UpdateProjectPayload {
                goal: Some("Ship it".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Alpha");
        assert_eq!(updated.goal.as_deref(), Some("Ship it"));
    }

    #[tokio::test]
    async fn add_member_is_idempotent_on_the_roster() {
        let store = MemoryStore::new();
        let project = create_project(&store, "alice", payload("Alpha")).await.unwrap();

        add_member(&store, &project.project_id, "bob", ProjectRole::Member)
            .await
            .unwrap();
        add_member(&store, &project.project_id, "bob", ProjectRole::Admin)
            .await
            .unwrap();

        let loaded = get_project(&store, &project.project_id).await.unwrap();
        assert_eq!(loaded.member_ids, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(loaded.roles.get("bob"), Some(&ProjectRole::Admin));
    }
}
