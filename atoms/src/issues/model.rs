use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// At most this many non-archived issues may exist per project.
pub const MAX_ACTIVE_ISSUES: usize = 50;

/// Fallback theme colors, picked deterministically from the issue id.
pub const THEME_PALETTE: [&str; 8] = [
    "#4f6bed", "#e8488a", "#13a10e", "#ff8c00",
    "#8764b8", "#038387", "#c239b3", "#986f0b",
];

/// Issue domain model - a unit of delivery inside a project
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Issue {
    pub issue_id: String,
    pub project_id: String,

    /// Unique among the project's active issues
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub theme_color: Option<String>,

    #[serde(default)]
    pub archived: bool,

    /// Derived by the aggregation engine; absent until first recompute
    #[serde(default)]
    pub progress: Option<f64>,

    /// Task highlighted on issue cards
    #[serde(default)]
    pub representative_task_id: Option<String>,

    /// Users who pinned this issue
    #[serde(default)]
    pub pinned_by: Vec<String>,

    #[serde(default)]
    pub created_at: String,
}

impl Issue {
    /// Stored theme color, or a stable palette pick derived from the issue id
    pub fn theme_color_or_default(&self) -> String {
        match &self.theme_color {
            Some(color) => color.clone(),
            None => default_theme_color(&self.issue_id),
        }
    }
}

/// Deterministic palette color for an issue without an explicit one
pub fn default_theme_color(issue_id: &str) -> String {
    let digest = Sha256::digest(issue_id.as_bytes());
    let idx = digest[0] as usize % THEME_PALETTE.len();
    THEME_PALETTE[idx].to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateIssuePayload {
    pub name: String,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub theme_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateIssuePayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub theme_color: Option<String>,
    pub archived: Option<bool>,
    pub representative_task_id: Option<String>,
    pub pinned_by: Option<Vec<String>>,
}
