use std::collections::HashMap;

use chrono::NaiveDate;
use stride_atoms::issues::model::MAX_ACTIVE_ISSUES;
use stride_atoms::tags::model::MAX_TAGS_PER_PROJECT;
use stride_atoms::tags::service::TagDirectory;
use stride_atoms::tasks::model::Task;
use stride_atoms::{attachments, comments, issues, projects, tasks};
use stride_shared::auth::{ProjectRole, RoleResolver};
use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, BlobStore, DocumentStore};

use crate::progress;
use crate::types::{MoveOverrides, MoveResult, RemovedAssignees};

/// Move an issue and everything beneath it from one project to another.
///
/// All preconditions are checked before the first write: admin role on both
/// ends, the target's active-issue cap, date reconciliation against the
/// target window, and coverage of every subordinate task by the clamped
/// window. The write phase itself is best effort: a failed issue or task
/// upsert or source delete aborts with the error, while per-comment,
/// per-attachment and tag-creation failures are logged and skipped. There is
/// no rollback; a partially applied move is repaired by calling again.
pub async fn move_issue(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    roles: &dyn RoleResolver,
    tags: &dyn TagDirectory,
    source_project_id: &str,
    issue_id: &str,
    target_project_id: &str,
    overrides: MoveOverrides,
) -> Result<MoveResult> {
    // STEP 1: caller must be admin in both projects
    roles
        .require_role(source_project_id, &[ProjectRole::Admin])
        .await?;
    roles
        .require_role(target_project_id, &[ProjectRole::Admin])
        .await?;

    // STEP 2: a same-project move is a read-only no-op
    if source_project_id == target_project_id {
        let issue = issues::service::get_issue(store, source_project_id, issue_id).await?;
        return Ok(MoveResult {
            final_name: overrides.name.unwrap_or(issue.name),
            date_adjusted: false,
            ..Default::default()
        });
    }

    // STEP 3: load the issue, its tasks and the target project
    let issue = issues::service::get_issue(store, source_project_id, issue_id).await?;
    let target = projects::service::get_project(store, target_project_id).await?;
    let source_tasks =
        tasks::service::load_tasks_for_issue(store, source_project_id, issue_id).await?;

    // STEP 4: the active-issue cap only binds issues arriving in the active set
    let will_be_archived = overrides.archived.unwrap_or(issue.archived);
    if !will_be_archived {
        let active = projects::service::active_issue_count(store, target_project_id).await?;
        if active >= MAX_ACTIVE_ISSUES {
            return Err(Error::Capacity(format!(
                "Project {} already has {} active issues",
                target_project_id, MAX_ACTIVE_ISSUES
            )));
        }
    }

    // STEP 5: reconcile dates with the target window and check that the
    // clamped window still covers every subordinate task
    let requested_start = overrides.start_date.unwrap_or(issue.start_date);
    let requested_end = overrides.end_date.unwrap_or(issue.end_date);

    let (start, end, date_adjusted) = dates::clamp_to_window(
        requested_start,
        requested_end,
        target.start_date,
        target.end_date,
    );

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(Error::Validation(format!(
                "Clamping to project {} leaves issue start {} after issue end {}",
                target_project_id, start, end
            )));
        }
    }

    validate_task_coverage(&source_tasks, start, end)?;

    // STEP 6: resolve the issue's name against the target's issues
    let desired_name = overrides.name.clone().unwrap_or_else(|| issue.name.clone());
    let target_issues = issues::service::load_issues_for_project(store, target_project_id).await?;
    let active_names: Vec<String> = target_issues
        .iter()
        .filter(|i| !i.archived)
        .map(|i| i.name.clone())
        .collect();
    let all_names: Vec<String> = target_issues.iter().map(|i| i.name.clone()).collect();
    let final_name = issues::service::resolve_name_conflict(&desired_name, &active_names, &all_names);

    // STEP 7: reconcile referenced tags into the target project
    let (tag_mapping, skipped_tags) =
        reconcile_tags(tags, &source_tasks, source_project_id, target_project_id).await?;

    // STEP 8: write the issue at its new home
    let mut moved = issue.clone();
    moved.project_id = target_project_id.to_string();
    moved.name = final_name.clone();
    moved.start_date = start;
    moved.end_date = end;
    moved.archived = will_be_archived;
    if let Some(description) = overrides.description {
        moved.description = description;
    }
    if let Some(goal) = overrides.goal {
        moved.goal = goal;
    }
    if let Some(theme_color) = overrides.theme_color {
        moved.theme_color = Some(theme_color);
    }

    store
        .upsert(&paths::issue(target_project_id, issue_id), encode(&moved)?)
        .await?;

    // STEP 9: move each task with its comments and attachments
    let mut removed_assignees = Vec::new();
    for task in &source_tasks {
        let mut moved_task = task.clone();
        moved_task.project_id = target_project_id.to_string();
        moved_task.tag_ids = task
            .tag_ids
            .iter()
            .filter_map(|tag_id| tag_mapping.get(tag_id).cloned())
            .collect();

        let (kept, removed) = prune_assignees(&task.assignee_ids, &target.member_ids);
        moved_task.assignee_ids = kept;
        if !removed.is_empty() {
            removed_assignees.push(RemovedAssignees {
                task_id: task.task_id.clone(),
                user_ids: removed,
            });
        }

        store
            .upsert(
                &paths::task(target_project_id, issue_id, &task.task_id),
                encode(&moved_task)?,
            )
            .await?;

        relocate_comments(store, source_project_id, target_project_id, issue_id, task).await;
        relocate_attachments(
            store,
            blobs,
            source_project_id,
            target_project_id,
            issue_id,
            task,
            &target.name,
            &final_name,
        )
        .await;

        store
            .delete(&paths::task(source_project_id, issue_id, &task.task_id))
            .await?;
    }

    // STEP 10: remove the source issue document
    store
        .delete(&paths::issue(source_project_id, issue_id))
        .await?;

    // STEP 11: refresh progress on both ends; the values are not inspected
    progress::recompute_project_progress(store, source_project_id).await;
    progress::recompute_project_progress(store, target_project_id).await;
    progress::recompute_issue_progress(store, target_project_id, issue_id).await;

    let mut result = MoveResult {
        final_name,
        date_adjusted,
        removed_assignees,
        skipped_tags,
        ..Default::default()
    };
    if date_adjusted {
        result.original_start = requested_start;
        result.original_end = requested_end;
        result.adjusted_start = start;
        result.adjusted_end = end;
    }

    Ok(result)
}

// PRIVATE FUNCTIONS

/// Every task must fit the clamped issue window before anything is written
fn validate_task_coverage(
    tasks: &[Task],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    for task in tasks {
        if let (Some(task_start), Some(start)) = (task.start_date, start) {
            if task_start < start {
                return Err(Error::Validation(format!(
                    "Task {} starts {} before the issue start {}",
                    task.task_id, task_start, start
                )));
            }
        }
        if let (Some(task_end), Some(end)) = (task.end_date, end) {
            if task_end > end {
                return Err(Error::Validation(format!(
                    "Task {} ends {} after the issue end {}",
                    task.task_id, task_end, end
                )));
            }
        }
    }

    Ok(())
}

/// Split assignees into those on the target roster and those to drop
fn prune_assignees(assignee_ids: &[String], member_ids: &[String]) -> (Vec<String>, Vec<String>) {
    let mut kept = Vec::new();
    let mut removed = Vec::new();

    for assignee in assignee_ids {
        if member_ids.contains(assignee) {
            kept.push(assignee.clone());
        } else {
            removed.push(assignee.clone());
        }
    }

    (kept, removed)
}

/// Distinct tag ids referenced by the tasks, in first-seen order
fn referenced_tag_ids(tasks: &[Task]) -> Vec<String> {
    let mut referenced = Vec::new();
    for task in tasks {
        for tag_id in &task.tag_ids {
            if !referenced.contains(tag_id) {
                referenced.push(tag_id.clone());
            }
        }
    }
    referenced
}

/// Build the source-to-target tag id mapping. Name matches map onto existing
/// target tags; the rest are created while the target stays under its tag
/// cap, in reference order. Tags left uncreated, whether over budget or
/// because creation failed, are reported back by name. A failed creation
/// does not consume budget.
async fn reconcile_tags(
    tags: &dyn TagDirectory,
    source_tasks: &[Task],
    source_project_id: &str,
    target_project_id: &str,
) -> Result<(HashMap<String, String>, Vec<String>)> {
    let mut mapping = HashMap::new();
    let mut skipped = Vec::new();

    let referenced = referenced_tag_ids(source_tasks);
    if referenced.is_empty() {
        return Ok((mapping, skipped));
    }

    let source_tags = tags.list_tags(source_project_id).await?;
    let target_tags = tags.list_tags(target_project_id).await?;
    let mut budget = MAX_TAGS_PER_PROJECT.saturating_sub(target_tags.len());

    for tag_id in referenced {
        let source_tag = match source_tags.iter().find(|t| t.tag_id == tag_id) {
            Some(source_tag) => source_tag,
            None => {
                tracing::warn!(
                    "Tag {} is not defined in project {}; dropping the reference",
                    tag_id,
                    source_project_id
                );
                continue;
            }
        };

        if let Some(existing) = target_tags.iter().find(|t| t.name == source_tag.name) {
            mapping.insert(tag_id, existing.tag_id.clone());
            continue;
        }

        if budget == 0 {
            skipped.push(source_tag.name.clone());
            continue;
        }

        match tags
            .create_tag(
                target_project_id,
                &source_tag.name,
                source_tag.color.as_deref(),
            )
            .await
        {
            Ok(created) => {
                mapping.insert(tag_id, created.tag_id);
                budget -= 1;
            }
            Err(e) => {
                tracing::error!(
                    "Tag \"{}\" could not be created in project {}: {:?}",
                    source_tag.name,
                    target_project_id,
                    e
                );
                skipped.push(source_tag.name.clone());
            }
        }
    }

    Ok((mapping, skipped))
}

/// Copy a task's comments to the target hierarchy and delete the originals.
/// Failures here are logged and leave the affected comment where it was.
async fn relocate_comments(
    store: &dyn DocumentStore,
    source_project_id: &str,
    target_project_id: &str,
    issue_id: &str,
    task: &Task,
) {
    let task_comments = match comments::service::load_comments_for_task(
        store,
        source_project_id,
        issue_id,
        &task.task_id,
    )
    .await
    {
        Ok(task_comments) => task_comments,
        Err(e) => {
            tracing::warn!(
                "Comment load failed for task {}; leaving its comments behind: {:?}",
                task.task_id,
                e
            );
            return;
        }
    };

    for comment in task_comments {
        let mut moved = comment.clone();
        moved.project_id = target_project_id.to_string();

        let fields = match encode(&moved) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("Comment {} could not be encoded: {:?}", comment.comment_id, e);
                continue;
            }
        };

        if let Err(e) = store
            .upsert(
                &paths::comment(target_project_id, issue_id, &task.task_id, &comment.comment_id),
                fields,
            )
            .await
        {
            tracing::warn!(
                "Comment {} could not be copied to project {}: {:?}",
                comment.comment_id,
                target_project_id,
                e
            );
            continue;
        }

        if let Err(e) = store
            .delete(&paths::comment(
                source_project_id,
                issue_id,
                &task.task_id,
                &comment.comment_id,
            ))
            .await
        {
            tracing::warn!(
                "Source comment {} could not be removed: {:?}",
                comment.comment_id,
                e
            );
        }
    }
}

/// Re-home a task's attachments: download each blob by its storage path,
/// upload it under the target hierarchy, write a fresh record with a new
/// locator and refreshed display names, then drop the old blob and record.
/// Any failure leaves that attachment fully in place and moves on.
async fn relocate_attachments(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    source_project_id: &str,
    target_project_id: &str,
    issue_id: &str,
    task: &Task,
    target_project_name: &str,
    final_issue_name: &str,
) {
    let task_attachments = match attachments::service::load_attachments_for_task(
        store,
        source_project_id,
        issue_id,
        &task.task_id,
    )
    .await
    {
        Ok(task_attachments) => task_attachments,
        Err(e) => {
            tracing::warn!(
                "Attachment load failed for task {}; leaving its attachments behind: {:?}",
                task.task_id,
                e
            );
            return;
        }
    };

    for attachment in task_attachments {
        if attachment.storage_path.is_empty() {
            tracing::warn!(
                "Attachment {} has no storage path; leaving it in place",
                attachment.attachment_id
            );
            continue;
        }

        // The storage path is the live lookup; stored URLs may have expired
        let bytes = match blobs.download(&attachment.storage_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    "Attachment {} could not be downloaded from {}: {:?}",
                    attachment.attachment_id,
                    attachment.storage_path,
                    e
                );
                continue;
            }
        };

        let new_path = attachments::service::blob_path(
            target_project_id,
            issue_id,
            &task.task_id,
            &attachment.attachment_id,
            &attachment.file_name,
        );

        let download_url = match blobs.upload(&new_path, bytes).await {
            Ok(download_url) => download_url,
            Err(e) => {
                tracing::warn!(
                    "Attachment {} could not be uploaded to {}: {:?}",
                    attachment.attachment_id,
                    new_path,
                    e
                );
                continue;
            }
        };

        let mut moved = attachment.clone();
        moved.project_id = target_project_id.to_string();
        moved.storage_path = new_path;
        moved.download_url = download_url;
        moved.project_name = Some(target_project_name.to_string());
        moved.issue_name = Some(final_issue_name.to_string());
        moved.task_title = Some(task.title.clone());

        let fields = match encode(&moved) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(
                    "Attachment {} could not be encoded: {:?}",
                    attachment.attachment_id,
                    e
                );
                continue;
            }
        };

        if let Err(e) = store
            .upsert(
                &paths::attachment(
                    target_project_id,
                    issue_id,
                    &task.task_id,
                    &attachment.attachment_id,
                ),
                fields,
            )
            .await
        {
            tracing::warn!(
                "Attachment record {} could not be written in project {}: {:?}",
                attachment.attachment_id,
                target_project_id,
                e
            );
            continue;
        }

        // Old blob and record go only after the copy landed
        if let Err(e) = blobs.delete(&attachment.storage_path).await {
            tracing::warn!(
                "Old blob {} could not be removed: {:?}",
                attachment.storage_path,
                e
            );
        }
        if let Err(e) = store
            .delete(&paths::attachment(
                source_project_id,
                issue_id,
                &task.task_id,
                &attachment.attachment_id,
            ))
            .await
        {
            tracing::warn!(
                "Source attachment record {} could not be removed: {:?}",
                attachment.attachment_id,
                e
            );
        }
    }
}
