/// Result alias used across the library
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors raised by the cache engine
///
/// Configuration problems are reported when something is built or configured, never half way
/// through a simulation. A cache miss is not an error, it's a counted outcome
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl CacheError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}
