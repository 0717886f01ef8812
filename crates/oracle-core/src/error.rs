//! Error types for the oracle contract
//!
//! All fallible operations return `Result<T, Error>`.
//! `NotFound` and `AlreadyResolved` are user-facing and become structured
//! `{success: false, error}` replies; `HostExecution` aborts the enclosing
//! write with no state change.

use thiserror::Error;

use crate::QuestionId;

/// Oracle error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Question id was never allocated
    #[error("question {0} not found")]
    NotFound(QuestionId),

    /// Resolution attempted on a question that already has its answer
    #[error("question {0} already resolved")]
    AlreadyResolved(QuestionId),

    /// Generation or equivalence primitive failed inside the host
    #[error("host execution failed: {0}")]
    HostExecution(String),

    /// 256-bit id space exhausted
    #[error("question counter overflow")]
    CounterOverflow,

    /// State or reply could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration document rejected
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wire message for errors reported as `{success: false, error}`.
    /// `None` for transaction-fatal errors.
    pub fn reply_message(&self) -> Option<&'static str> {
        match self {
            Error::NotFound(_) => Some("Question not found"),
            Error::AlreadyResolved(_) => Some("Already resolved"),
            _ => None,
        }
    }
}

/// Result type alias for oracle operations
pub type Result<T> = std::result::Result<T, Error>;
