use async_trait::async_trait;
use stride_shared::dates;
use stride_shared::error::{Error, Result};
use stride_shared::store::{encode, paths, DocumentStore};

use super::model::{Tag, MAX_TAGS_PER_PROJECT};

/// Load all tags for a project
pub async fn load_tags_for_project(
    store: &dyn DocumentStore,
    project_id: &str,
) -> Result<Vec<Tag>> {
    let docs = store.list(&paths::tags(project_id), None).await?;

    let mut tags = Vec::new();
    for doc in docs {
        tags.push(doc.decode()?);
    }

    Ok(tags)
}

/// Get a specific tag
pub async fn get_tag(store: &dyn DocumentStore, project_id: &str, tag_id: &str) -> Result<Tag> {
    let doc = store
        .get(&paths::tag(project_id, tag_id))
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("Tag {} not found in project {}", tag_id, project_id))
        })?;

    Ok(doc.decode()?)
}

/// Create a new tag in a project. Names are unique per project and the
/// per-project tag count is capped.
pub async fn create_tag(
    store: &dyn DocumentStore,
    project_id: &str,
    name: &str,
    color: Option<&str>,
) -> Result<Tag> {
    crate::projects::service::get_project(store, project_id).await?;

    let existing = load_tags_for_project(store, project_id).await?;
    if existing.iter().any(|t| t.name == name) {
        return Err(Error::Validation(format!(
            "A tag named \"{}\" already exists in project {}",
            name, project_id
        )));
    }
    if existing.len() >= MAX_TAGS_PER_PROJECT {
        return Err(Error::Capacity(format!(
            "Project {} already has {} tags",
            project_id, MAX_TAGS_PER_PROJECT
        )));
    }

    let tag_id = uuid::Uuid::new_v4().to_string();
    let tag = Tag {
        tag_id: tag_id.clone(),
        project_id: project_id.to_string(),
        name: name.to_string(),
        color: color.map(|c| c.to_string()),
        created_at: dates::now_rfc3339(),
    };

    store
        .upsert(&paths::tag(project_id, &tag_id), encode(&tag)?)
        .await?;

    Ok(tag)
}

/// Delete a tag
pub async fn delete_tag(store: &dyn DocumentStore, project_id: &str, tag_id: &str) -> Result<()> {
    store.delete(&paths::tag(project_id, tag_id)).await?;
    Ok(())
}

/// Tag lookup and creation seam consumed by cross-project operations
#[async_trait]
pub trait TagDirectory: Send + Sync {
    async fn list_tags(&self, project_id: &str) -> Result<Vec<Tag>>;

    async fn create_tag(&self, project_id: &str, name: &str, color: Option<&str>) -> Result<Tag>;
}

/// TagDirectory backed by the document store
pub struct StoreTagDirectory<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> StoreTagDirectory<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        StoreTagDirectory { store }
    }
}

#[async_trait]
impl TagDirectory for StoreTagDirectory<'_> {
    async fn list_tags(&self, project_id: &str) -> Result<Vec<Tag>> {
        load_tags_for_project(self.store, project_id).await
    }

    async fn create_tag(&self, project_id: &str, name: &str, color: Option<&str>) -> Result<Tag> {
        create_tag(self.store, project_id, name, color).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::model::CreateProjectPayload;
    use stride_shared::store::MemoryStore;

    async fn seeded_project(store: &MemoryStore) -> String {
        let project = crate::projects::service::create_project(
            store,
            "owner-1",
            CreateProjectPayload {
                name: "Apollo".to_string(),
                description: None,
                goal: None,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
        project.project_id
    }

    #[tokio::test]
    async fn created_tags_round_trip() {
        let store = MemoryStore::new();
        let project_id = seeded_project(&store).await;

        let tag = create_tag(&store, &project_id, "backend", Some("#13a10e"))
            .await
            .unwrap();

        let loaded = get_tag(&store, &project_id, &tag.tag_id).await.unwrap();
        assert_eq!(loaded.name, "backend");
        assert_eq!(loaded.color.as_deref(), Some("#13a10e"));
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let store = MemoryStore::new();
        let project_id = seeded_project(&store).await;

        create_tag(&store, &project_id, "backend", None)
            .await
            .unwrap();
        let err = create_tag(&store, &project_id, "backend", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn tag_count_is_capped_per_project() {
        let store = MemoryStore::new();
        let project_id = seeded_project(&store).await;

        for n in 0..MAX_TAGS_PER_PROJECT {
            create_tag(&store, &project_id, &format!("tag-{}", n), None)
                .await
                .unwrap();
        }

        let err = create_tag(&store, &project_id, "one-too-many", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Capacity(_)));
    }
}
