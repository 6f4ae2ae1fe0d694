use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, DocumentStore};

use super::model::Comment;

/// Add a comment to a task
pub async fn add_comment(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    author_id: &str,
    body: &str,
) -> Result<Comment> {
    crate::tasks::service::get_task(store, project_id, issue_id, task_id).await?;

    let comment_id = uuid::Uuid::new_v4().to_string();
    let comment = Comment {
        comment_id: comment_id.clone(),
        project_id: project_id.to_string(),
        issue_id: issue_id.to_string(),
        task_id: task_id.to_string(),
        author_id: author_id.to_string(),
        body: body.to_string(),
        created_at: dates::now_rfc3339(),
    };

    store
        .upsert(
            &paths::comment(project_id, issue_id, task_id, &comment_id),
            encode(&comment)?,
        )
        .await?;

    Ok(comment)
}

/// Load all comments for a task
pub async fn load_comments_for_task(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
) -> Result<Vec<Comment>> {
    let docs = store
        .list(&paths::comments(project_id, issue_id, task_id), None)
        .await?;

    let mut comments = Vec::new();
    for doc in docs {
        comments.push(doc.decode()?);
    }

    Ok(comments)
}

/// Delete a comment
pub async fn delete_comment(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    task_id: &str,
    comment_id: &str,
) -> Result<()> {
    store
        .delete(&paths::comment(project_id, issue_id, task_id, comment_id))
        .await?;
    Ok(())
}
