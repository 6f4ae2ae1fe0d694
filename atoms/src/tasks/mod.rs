
// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{ChecklistItem, CreateTaskPayload, Importance, Task, TaskStatus, UpdateTaskPayload};
pub use service::*;
