//! # Consumer Errors
//!
//! This module defines the single error type returned by every consumer operation.
//! Server-reported failures, transport failures and (de)serialization failures all
//! travel through [`ConsumerError`], so callers match on one enum regardless of which
//! operation they invoked.

use crate::problem::ProblemDetails;

/// The result of any consumer operation.
///
/// Success carries the decoded payload; failure carries a [`ConsumerError`].
pub type OperationResult<T> = Result<T, ConsumerError>;

/// Errors that can occur while consuming a remote resource.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// The server answered with a non-success status.
    #[error("Request failed: {0}")]
    Problem(ProblemDetails),
    /// The API client could not complete the exchange.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Failed to serialize request payload: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Request cancelled")]
    Cancelled,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ConsumerError {
    /// Returns the problem details when the server reported the failure.
    pub fn problem(&self) -> Option<&ProblemDetails> {
        match self {
            ConsumerError::Problem(details) => Some(details),
            _ => None,
        }
    }

    /// Returns the HTTP status reported by the server, if any.
    pub fn status(&self) -> Option<u16> {
        self.problem().and_then(|details| details.status)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConsumerError::Cancelled)
    }
}

impl From<ProblemDetails> for ConsumerError {
    fn from(details: ProblemDetails) -> Self {
        ConsumerError::Problem(details)
    }
}
