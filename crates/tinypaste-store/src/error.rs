//! Error types for the paste store.

use thiserror::Error;

/// Result type alias for paste store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during paste store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no free identifier after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl StoreError {
    pub(crate) fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// True for faults an operator should look at, as opposed to outcomes
    /// caused by the client's request.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Exhausted { .. })
    }
}
