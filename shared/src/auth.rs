use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{paths, DocumentStore};

/// Role a user holds within one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Admin,
    Member,
    Guest,
}

impl ProjectRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::Member => "member",
            ProjectRole::Guest => "guest",
        }
    }

    pub fn parse(value: &str) -> Option<ProjectRole> {
        match value {
            "admin" => Some(ProjectRole::Admin),
            "member" => Some(ProjectRole::Member),
            "guest" => Some(ProjectRole::Guest),
            _ => None,
        }
    }
}

/// Resolves the caller's membership role in a project.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Returns the caller's user id when their role in `project_id` is one of
    /// `accepted`. Fails with `Authorization` otherwise, and with `NotFound`
    /// when the project does not exist.
    async fn require_role(&self, project_id: &str, accepted: &[ProjectRole]) -> Result<String>;
}

/// Role resolver reading the project's `roles` map from the document store.
/// Caller identity is established by the session layer and injected here.
pub struct StoreRoleResolver<'a> {
    store: &'a dyn DocumentStore,
    caller_id: String,
}

impl<'a> StoreRoleResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore, caller_id: impl Into<String>) -> Self {
        StoreRoleResolver {
            store,
            caller_id: caller_id.into(),
        }
    }
}

#[async_trait]
impl RoleResolver for StoreRoleResolver<'_> {
    async fn require_role(&self, project_id: &str, accepted: &[ProjectRole]) -> Result<String> {
        let doc = self
            .store
            .get(&paths::project(project_id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("Project {} not found", project_id)))?;

        let role = doc
            .fields
            .get("roles")
            .and_then(|roles| roles.get(self.caller_id.as_str()))
            .and_then(|v| v.as_str())
            .and_then(ProjectRole::parse);

        match role {
            Some(role) if accepted.contains(&role) => Ok(self.caller_id.clone()),
            _ => Err(Error::Authorization(format!(
                "User {} does not hold a required role in project {}",
                self.caller_id, project_id
            ))),
        }
    }
}
