// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{CreateIssuePayload, Issue, UpdateIssuePayload, MAX_ACTIVE_ISSUES};
pub use service::*;
