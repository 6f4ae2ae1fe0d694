use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Importance band of a task, the input to progress weighting
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    High,
    Medium,
    Low,
}

impl Importance {
    /// Aggregation weight for this importance band
    pub fn weight(self) -> f64 {
        match self {
            Importance::Critical => 4.0,
            Importance::High => 3.0,
            Importance::Medium => 2.0,
            Importance::Low => 1.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Incomplete,
    InProgress,
    Completed,
    OnHold,
    Discarded,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Incomplete
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Task domain model - represents a unit of work under an issue
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    pub task_id: String,
    pub project_id: String,
    pub issue_id: String,

    #[serde(default)]
    pub title: String,

    /// Both dates must lie inside the owning issue's window
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub importance: Option<Importance>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub archived: bool,

    /// Subset of the owning project's member roster
    #[serde(default)]
    pub assignee_ids: Vec<String>,

    /// References into the project-scoped tag set
    #[serde(default)]
    pub tag_ids: Vec<String>,

    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,

    /// Derived from the checklist unless set directly
    #[serde(default)]
    pub progress: Option<f64>,

    #[serde(default)]
    pub created_at: String,
}

impl Task {
    /// Importance weight, defaulting to 1.0 when no importance is set
    pub fn weight(&self) -> f64 {
        self.importance.map(Importance::weight).unwrap_or(1.0)
    }

    /// True when the task no longer counts toward progress aggregation
    pub fn excluded_from_progress(&self) -> bool {
        self.archived || self.status == TaskStatus::Discarded
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskPayload {
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub importance: Option<Importance>,
    #[serde(default)]
    pub assignee_ids: Vec<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub importance: Option<Importance>,
    pub status: Option<TaskStatus>,
    pub archived: Option<bool>,
    pub assignee_ids: Option<Vec<String>>,
    pub tag_ids: Option<Vec<String>>,
}
