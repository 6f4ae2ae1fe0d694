// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{CreateProjectPayload, Project, UpdateProjectPayload};
pub use service::*;
