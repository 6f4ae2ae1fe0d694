use crate::store::StoreError;

/// Domain error taxonomy shared across all crates in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Message safe to show end users. Precondition failures carry specific,
    /// actionable text and pass through verbatim; conflicts collapse to a
    /// generic stale-data message instead of leaking store error codes.
    pub fn user_message(&self) -> String {
        match self {
            Error::Conflict(_) => {
                "This item was changed by someone else. Reload and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => Error::NotFound(path),
            StoreError::Conflict(msg) => Error::Conflict(msg),
            other => Error::Store(other),
        }
    }
}
