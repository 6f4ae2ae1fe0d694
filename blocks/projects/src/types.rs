use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Field overrides applied to an issue as it moves between projects.
/// Double-optional fields distinguish "leave unchanged" (absent) from an
/// explicit clear (null in the payload).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveOverrides {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub goal: Option<Option<String>>,
    pub theme_color: Option<String>,
    pub archived: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Assignees dropped from one task because they are not members of the
/// target project
#[derive(Debug, Clone, Serialize)]
pub struct RemovedAssignees {
    pub task_id: String,
    pub user_ids: Vec<String>,
}

/// Outcome summary of a cross-project issue move
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoveResult {
    pub final_name: String,
    pub date_adjusted: bool,

    // Populated only when a clamp fired: the requested dates and what they
    // became
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_end: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_assignees: Vec<RemovedAssignees>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_tags: Vec<String>,
}
