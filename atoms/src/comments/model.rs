use serde::{Deserialize, Serialize};

/// Comment domain model - discussion attached to a task
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    pub comment_id: String,
    pub project_id: String,
    pub issue_id: String,
    pub task_id: String,

    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
}
