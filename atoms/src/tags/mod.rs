
// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{Tag, MAX_TAGS_PER_PROJECT};
pub use service::*;
