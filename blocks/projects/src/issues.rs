use stride_atoms::{issues, tasks};
use stride_shared::error::Result;
use stride_shared::store::{paths, BlobStore, DocumentStore};

use crate::progress;

/// Delete an issue and everything beneath it, then refresh the project's
/// progress. Tasks cascade to their comments and attachments, blob content
/// included.
pub async fn delete_issue(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    project_id: &str,
    issue_id: &str,
) -> Result<()> {
    issues::service::get_issue(store, project_id, issue_id).await?;

    // STEP 1: delete tasks and their dependent records
    let issue_tasks = tasks::service::load_tasks_for_issue(store, project_id, issue_id).await?;
    for task in issue_tasks {
        tasks::service::delete_task(store, blobs, project_id, issue_id, &task.task_id).await?;
    }

    // STEP 2: delete the issue itself
    store.delete(&paths::issue(project_id, issue_id)).await?;

    // STEP 3: the project's progress no longer includes this issue
    progress::recompute_project_progress(store, project_id).await;

    Ok(())
}
