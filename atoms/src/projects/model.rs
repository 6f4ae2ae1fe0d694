use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stride_shared::auth::ProjectRole;

/// Project domain model - the root container for issues
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub project_id: String,
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

    /// Ordered roster; task assignees must come from this list
    #[serde(default)]
    pub member_ids: Vec<String>,

    /// user_id -> role within this project
    #[serde(default)]
    pub roles: HashMap<String, ProjectRole>,

    #[serde(default)]
    pub archived: bool,

    /// Derived by the aggregation engine, never hand-edited
    #[serde(default)]
    pub progress: Option<f64>,

    #[serde(default)]
    pub created_at: String,
}

impl Project {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|m| m == user_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectPayload {
    pub name: String,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub archived: Option<bool>,
}
