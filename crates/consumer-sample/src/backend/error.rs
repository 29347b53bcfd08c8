//! Error types for the in-memory backend.

use resource_consumer::ProblemDetails;
use thiserror::Error;

/// Failures the backend reports to callers as problem-details responses.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The requested resource or route does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The call required a session and the client has none.
    #[error("Authentication required")]
    Unauthorized,

    /// The request body or parameters are invalid.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The route exists but does not accept this method.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl BackendError {
    pub fn status(&self) -> u16 {
        match self {
            BackendError::NotFound(_) => 404,
            BackendError::Unauthorized => 401,
            BackendError::ValidationError(_) => 400,
            BackendError::MethodNotAllowed(_) => 405,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            BackendError::NotFound(_) => "Not Found",
            BackendError::Unauthorized => "Unauthorized",
            BackendError::ValidationError(_) => "Bad Request",
            BackendError::MethodNotAllowed(_) => "Method Not Allowed",
        }
    }

    /// Renders the error as the problem document a server would send for `uri`.
    pub fn to_problem(&self, uri: &str) -> ProblemDetails {
        ProblemDetails::new(self.status(), self.title())
            .with_detail(self.to_string())
            .with_instance(uri)
    }
}
