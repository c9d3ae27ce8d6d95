// Shared error types

use crate::processing::ProcessingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A submission was attempted without a selected file or without a credential.
    #[error("Cannot submit: {0}")]
    Precondition(&'static str),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
