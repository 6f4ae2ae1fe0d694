use serde::{Deserialize, Serialize};

/// Hard ceiling on tags per project
pub const MAX_TAGS_PER_PROJECT: usize = 20;

/// Tag domain model - a project-scoped label applied to tasks
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Tag {
    pub tag_id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: String,
}
