pub mod auth;
pub mod dates;
pub mod error;
pub mod store;

pub use error::{Error, Result};
