//! Errors

/// Error returned by a fallible enter/exit handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Handler failed: {0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// In-view error
#[derive(Debug, thiserror::Error)]
pub enum InViewError {
    #[error("Invalid selector: {0:?}")]
    InvalidSelector(String),

    /// Setting can only change before the first `control()` call
    #[error("Cannot change {0} after in-view is initialized")]
    AlreadyInitialized(&'static str),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}
