use serde::{Deserialize, Serialize};

/// Attachment domain model - a stored file hanging off a task
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Attachment {
    pub attachment_id: String,
    pub project_id: String,
    pub issue_id: String,
    pub task_id: String,

    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size_bytes: u64,

    /// Key of the blob content in the blob store
    #[serde(default)]
    pub storage_path: String,

    /// Locator handed to clients; minted fresh whenever the blob moves
    #[serde(default)]
    pub download_url: String,

    // Denormalized for list views; refreshed when the attachment moves
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub issue_name: Option<String>,
    #[serde(default)]
    pub task_title: Option<String>,

    #[serde(default)]
    pub created_at: String,
}
