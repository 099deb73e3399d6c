use thiserror::Error;

/// Errors raised by conversation stores.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The requested conversation does not exist.
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// The backing storage could not be opened or migrated.
    #[error("Conversation store unavailable ({backend}): {message}")]
    Unavailable { backend: String, message: String },

    /// A read or write against an open store failed.
    #[error("Conversation store error ({backend}): {message}")]
    Storage { backend: String, message: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;
