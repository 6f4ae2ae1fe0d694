// Composite operations over the project hierarchy: progress aggregation,
// cross-project issue migration, and cascade deletes.

pub mod issues;
pub mod migrate;
pub mod progress;
pub mod types;

pub use issues::delete_issue;
pub use migrate::move_issue;
pub use progress::{recompute_issue_progress, recompute_project_progress};
pub use types::{MoveOverrides, MoveResult, RemovedAssignees};
