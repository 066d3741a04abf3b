use thiserror::Error;

/// A broken entity rule. The message is shown to the user as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self { Self(message.into()) }
}

/// Failure of a backing store: the remote API, the local key-value store, or the data in it.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Todo not found")]
    NotFound,

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error returned by the use cases. `Display` is the text shown in the error notification.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Todo not found")]
    NotFound,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_surface_unwrapped() {
        let e: TodoError = ValidationError::new("Title is required, Title must be less than 200 characters").into();
        assert_eq!(e.to_string(), "Title is required, Title must be less than 200 characters");

        let e: TodoError = PersistenceError::Api { status: 401, message: "unauthorized".into() }.into();
        assert_eq!(e.to_string(), "unauthorized");

        assert_eq!(TodoError::NotFound.to_string(), "Todo not found");
    }
}
