use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, BlobStore, DocumentStore};

use super::model::Attachment;

/// Blob key for an attachment's content
pub fn blob_path(
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    attachment_id: &str,
    file_name: &str,
) -> String {
    format!(
        "projects/{}/issues/{}/tasks/{}/attachments/{}/{}",
        project_id, issue_id, task_id, attachment_id, file_name
    )
}

/// Upload attachment content and create its record under a task
pub async fn store_attachment(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<Attachment> {
    let project = crate::projects::service::get_project(store, project_id).await?;
    let issue = crate::issues::service::get_issue(store, project_id, issue_id).await?;
    let task = crate::tasks::service::get_task(store, project_id, issue_id, task_id).await?;

    let attachment_id = uuid::Uuid::new_v4().to_string();
    let storage_path = blob_path(project_id, issue_id, task_id, &attachment_id, file_name);
    let size_bytes = bytes.len() as u64;

    let download_url = blobs.upload(&storage_path, bytes).await?;

    let attachment = Attachment {
        attachment_id: attachment_id.clone(),
        project_id: project_id.to_string(),
        issue_id: issue_id.to_string(),
        task_id: task_id.to_string(),
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        size_bytes,
        storage_path,
        download_url,
        project_name: Some(project.name),
        issue_name: Some(issue.name),
        task_title: Some(task.title),
        created_at: dates::now_rfc3339(),
    };

    store
        .upsert(
            &paths::attachment(project_id, issue_id, task_id, &attachment_id),
            encode(&attachment)?,
        )
        .await?;

    Ok(attachment)
}

/// Load all attachments for a task
pub async fn load_attachments_for_task(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
) -> Result<Vec<Attachment>> {
    let docs = store
        .list(&paths::attachments(project_id, issue_id, task_id), None)
        .await?;

    let mut attachments = Vec::new();
    for doc in docs {
        attachments.push(doc.decode()?);
    }

    Ok(attachments)
}

/// Get a specific attachment
pub async fn get_attachment(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    attachment_id: &str,
) -> Result<Attachment> {
    let doc = store
        .get(&paths::attachment(project_id, issue_id, task_id, attachment_id))
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Attachment {} not found in task {}",
                attachment_id, task_id
            ))
        })?;

    Ok(doc.decode()?)
}

/// Delete an attachment record and its blob content
pub async fn delete_attachment(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    attachment_id: &str,
) -> Result<()> {
    let attachment = get_attachment(store, project_id, issue_id, task_id, attachment_id).await?;

    // Blob removal is best effort
    if !attachment.storage_path.is_empty() {
        blobs.delete(&attachment.storage_path).await.ok();
    }

    store
        .delete(&paths::attachment(project_id, issue_id, task_id, attachment_id))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::model::CreateIssuePayload;
    use crate::projects::model::CreateProjectPayload;
    use crate::tasks::model::CreateTaskPayload;
    use stride_shared::store::{MemoryBlobStore, MemoryStore};

    async fn seeded_task(store: &MemoryStore) -> (String, String, String) {
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

        let task = crate::tasks::service::create_task(
            store,
            &project.project_id,
            &issue.issue_id,
            CreateTaskPayload {
                title: "Wiring".to_string(),
                start_date: None,
                end_date: None,
                importance: None,
                assignee_ids: Vec::new(),
                tag_ids: Vec::new(),
            },
        )
        .await
        .unwrap();

        (project.project_id, issue.issue_id, task.task_id)
    }

    #[tokio::test]
    async fn stored_attachments_carry_denormalized_names() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let (project_id, issue_id, task_id) = seeded_task(&store).await;

        let attachment = store_attachment(
            &store,
            &blobs,
            &project_id,
            &issue_id,
            &task_id,
            "plan.pdf",
            "application/pdf",
            b"plan".to_vec(),
        )
        .await
        .unwrap();

        assert_eq!(attachment.project_name.as_deref(), Some("Apollo"));
        assert_eq!(attachment.issue_name.as_deref(), Some("Launch"));
        assert_eq!(attachment.task_title.as_deref(), Some("Wiring"));
        assert_eq!(attachment.size_bytes, 4);
        assert!(attachment.storage_path.ends_with("/plan.pdf"));
        assert!(blobs.contains(&attachment.storage_path).await);

        let content = blobs.download(&attachment.storage_path).await.unwrap();
        assert_eq!(content, b"plan".to_vec());
    }

    #[tokio::test]
    async fn delete_removes_both_record_and_blob() {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let (project_id, issue_id, task_id) = seeded_task(&store).await;

        let attachment = store_attachment(
            &store,
            &blobs,
            &project_id,
            &issue_id,
            &task_id,
            "plan.pdf",
            "application/pdf",
            b"plan".to_vec(),
        )
        .await
        .unwrap();

        delete_attachment(
            &store,
            &blobs,
            &project_id,
            &issue_id,
            &task_id,
            &attachment.attachment_id,
        )
        .await
        .unwrap();

        assert!(!blobs.contains(&attachment.storage_path).await);
        let err = get_attachment(
            &store,
            &project_id,
            &issue_id,
            &task_id,
            &attachment.attachment_id,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
