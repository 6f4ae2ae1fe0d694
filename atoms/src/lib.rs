pub mod attachments;
pub mod comments;
pub mod issues;
pub mod projects;
pub mod tags;
pub mod tasks;
