//! Error types for quotedesk.
//!
//! Uses thiserror for derive macros. The first six variants are the workflow
//! taxonomy surfaced to callers verbatim; the rest cover the ambient concerns
//! of the library and CLI.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for quote operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// The quote or a referenced product is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The acting customer does not own the quote.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The operation is not legal in the quote's current stage.
    #[error("invalid stage: {0}")]
    InvalidStage(String),

    /// Submit or confirm was attempted on a quote with no items.
    #[error("quote '{0}' has no items")]
    EmptyQuote(String),

    /// An approval-system round-trip failed.
    #[error("approval system sync failed: {0}")]
    ExternalSyncFailure(String),

    /// The store rejected the save.
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),

    /// Caller supplied a value the workflow cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Waiting for a quote lock exceeded the configured budget.
    #[error("timed out waiting for lock '{0}'")]
    LockTimeout(String),

    /// Configuration, filesystem or serialization failure.
    #[error("{0}")]
    UserError(String),
}

impl QuoteError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            QuoteError::NotFound(_) => exit_codes::NOT_FOUND,
            QuoteError::Forbidden(_) => exit_codes::FORBIDDEN,
            QuoteError::InvalidStage(_) | QuoteError::EmptyQuote(_) => exit_codes::INVALID_STAGE,
            QuoteError::ExternalSyncFailure(_) => exit_codes::EXTERNAL_FAILURE,
            QuoteError::PersistenceConflict(_) => exit_codes::CONFLICT,
            QuoteError::LockTimeout(_) => exit_codes::LOCK_TIMEOUT,
            QuoteError::InvalidInput(_) | QuoteError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;
