use serde_json::Value;
use stride_atoms::tasks::model::Task;
use stride_atoms::{issues, tasks};
use stride_shared::store::{paths, DocumentStore};

/// Weighted average of task progress by importance weight. Archived and
/// discarded tasks are excluded; unset progress counts as 0; no qualifying
/// tasks means 0.
pub fn weighted_task_progress(tasks: &[Task]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for task in tasks.iter().filter(|t| !t.excluded_from_progress()) {
        let weight = task.weight();
        weighted_sum += task.progress.unwrap_or(0.0) * weight;
        total_weight += weight;
    }

    if total_weight == 0.0 {
        return 0.0;
    }

    round_progress(weighted_sum / total_weight)
}

/// Weight an issue contributes to its project's progress: the mean
/// importance weight of its qualifying tasks, or 1.0 when it has none.
pub fn derived_issue_weight(tasks: &[Task]) -> f64 {
    let weights: Vec<f64> = tasks
        .iter()
        .filter(|t| !t.excluded_from_progress())
        .map(Task::weight)
        .collect();

    if weights.is_empty() {
        return 1.0;
    }

    weights.iter().sum::<f64>() / weights.len() as f64
}

/// Round to one decimal place and clamp into the 0..=100 band
pub fn round_progress(value: f64) -> f64 {
    ((value * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

/// Recompute an issue's progress from its tasks and persist it onto the
/// issue document. Store failures are logged and degrade the result to 0;
/// this never fails the caller.
pub async fn recompute_issue_progress(
    store: &dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
) -> f64 {
    let tasks = match tasks::service::load_tasks_for_issue(store, project_id, issue_id).await {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::error!(
                "Task load failed while recomputing issue {} progress: {:?}",
                issue_id,
                e
            );
            return 0.0;
        }
    };

    let progress = weighted_task_progress(&tasks);

    let mut fields = serde_json::Map::new();
    fields.insert("progress".to_string(), Value::from(progress));

    if let Err(e) = store
        .update(
            &paths::issue(project_id, issue_id),
            Value::Object(fields),
            None,
        )
        .await
    {
        tracing::error!("Progress write failed for issue {}: {:?}", issue_id, e);
        return 0.0;
    }

    progress
}

/// Recompute a project's progress from its issues and persist it onto the
/// project document. Archived issues and issues whose progress was never
/// computed stay out of the average; each remaining issue weighs in at the
/// mean importance weight of its tasks, 1.0 when it has none.
pub async fn recompute_project_progress(store: &dyn DocumentStore, project_id: &str) -> f64 {
    let project_issues = match issues::service::load_issues_for_project(store, project_id).await {
        Ok(project_issues) => project_issues,
        Err(e) => {
            tracing::error!(
                "Issue load failed while recomputing project {} progress: {:?}",
                project_id,
                e
            );
            return 0.0;
        }
    };

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for issue in project_issues.iter().filter(|i| !i.archived) {
        let progress = match issue.progress {
            Some(progress) => progress,
            None => continue,
        };

        let issue_tasks =
            match tasks::service::load_tasks_for_issue(store, project_id, &issue.issue_id).await {
                Ok(issue_tasks) => issue_tasks,
                Err(e) => {
                    tracing::error!(
                        "Task load failed while recomputing project {} progress: {:?}",
                        project_id,
                        e
                    );
                    return 0.0;
                }
            };

        let weight = derived_issue_weight(&issue_tasks);
        weighted_sum += progress * weight;
        total_weight += weight;
    }

    let progress = if total_weight == 0.0 {
        0.0
    } else {
        round_progress(weighted_sum / total_weight)
    };

    let mut fields = serde_json::Map::new();
    fields.insert("progress".to_string(), Value::from(progress));

    if let Err(e) = store
        .update(&paths::project(project_id), Value::Object(fields), None)
        .await
    {
        tracing::error!("Progress write failed for project {}: {:?}", project_id, e);
        return 0.0;
    }

    progress
}
