use std::fmt;

/// Path of one document in the hierarchical store, e.g. `projects/p1/issues/i1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<(String, String)>,
}

/// Path of a collection, e.g. `projects/p1/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    parent: Vec<(String, String)>,
    collection: String,
}

impl DocPath {
    /// Identifier of the document itself (the last path segment).
    pub fn id(&self) -> &str {
        &self.segments[self.segments.len() - 1].1
    }

    /// Name of the collection the document sits in.
    pub fn collection(&self) -> &str {
        &self.segments[self.segments.len() - 1].0
    }

    /// Document owning this one, if any.
    pub fn parent_doc(&self) -> Option<DocPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(DocPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Collection containing this document.
    pub fn collection_path(&self) -> CollectionPath {
        CollectionPath {
            parent: self.segments[..self.segments.len() - 1].to_vec(),
            collection: self.segments[self.segments.len() - 1].0.clone(),
        }
    }

    fn subcollection(&self, name: &str) -> CollectionPath {
        CollectionPath {
            parent: self.segments.clone(),
            collection: name.to_string(),
        }
    }
}

impl CollectionPath {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Document owning this collection, if any.
    pub fn parent_doc(&self) -> Option<DocPath> {
        if self.parent.is_empty() {
            return None;
        }
        Some(DocPath {
            segments: self.parent.clone(),
        })
    }

    /// Path of the document with the given id inside this collection.
    pub fn doc(&self, id: &str) -> DocPath {
        let mut segments = self.parent.clone();
        segments.push((self.collection.clone(), id.to_string()));
        DocPath { segments }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (collection, id)) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}/{}", collection, id)?;
        }
        Ok(())
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent_doc() {
            Some(parent) => write!(f, "{}/{}", parent, self.collection),
            None => write!(f, "{}", self.collection),
        }
    }
}

/// Root collection of projects.
pub fn projects() -> CollectionPath {
    CollectionPath {
        parent: Vec::new(),
        collection: "projects".to_string(),
    }
}

pub fn project(project_id: &str) -> DocPath {
    projects().doc(project_id)
}

pub fn issues(project_id: &str) -> CollectionPath {
    project(project_id).subcollection("issues")
}

pub fn issue(project_id: &str, issue_id: &str) -> DocPath {
    issues(project_id).doc(issue_id)
}

pub fn tags(project_id: &str) -> CollectionPath {
    project(project_id).subcollection("tags")
}

pub fn tag(project_id: &str, tag_id: &str) -> DocPath {
    tags(project_id).doc(tag_id)
}

pub fn tasks(project_id: &str, issue_id: &str) -> CollectionPath {
    issue(project_id, issue_id).subcollection("tasks")
}

pub fn task(project_id: &str, issue_id: &str, task_id: &str) -> DocPath {
    tasks(project_id, issue_id).doc(task_id)
}

pub fn comments(project_id: &str, issue_id: &str, task_id: &str) -> CollectionPath {
    task(project_id, issue_id, task_id).subcollection("comments")
}

pub fn comment(project_id: &str, issue_id: &str, task_id: &str, comment_id: &str) -> DocPath {
    comments(project_id, issue_id, task_id).doc(comment_id)
}

pub fn attachments(project_id: &str, issue_id: &str, task_id: &str) -> CollectionPath {
    task(project_id, issue_id, task_id).subcollection("attachments")
}

pub fn attachment(project_id: &str, issue_id: &str, task_id: &str, attachment_id: &str) -> DocPath {
    attachments(project_id, issue_id, task_id).doc(attachment_id)
}
